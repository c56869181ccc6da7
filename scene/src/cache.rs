//! Draw-order lists, computed once per decoded frame.

use std::collections::BTreeMap;

use crate::types::{Mobile, Picture};

/// Precomputed draw order for one frame.
///
/// Picture buckets hold indices into the frame's picture list, each sorted by
/// `(plane, v, h)`. Mobile buckets hold mobile indices sorted by `(v, h)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderCache {
    /// Pictures on planes below zero, drawn first.
    pub below: Vec<usize>,
    /// Pictures on plane zero, interleaved with mobiles.
    pub ground: Vec<usize>,
    /// Pictures on planes above zero, drawn last.
    pub above: Vec<usize>,
    pub live_mobiles: Vec<u8>,
    pub dead_mobiles: Vec<u8>,
    /// Mobiles with a name tag, in tag draw order.
    pub name_tags: Vec<u8>,
}

impl RenderCache {
    /// Builds the cache for `pictures` and `mobiles`.
    #[must_use]
    pub fn build(pictures: &[Picture], mobiles: &BTreeMap<u8, Mobile>) -> Self {
        let mut order: Vec<usize> = (0..pictures.len()).collect();
        order.sort_by_key(|&index| {
            let picture = &pictures[index];
            (picture.plane, picture.pos.v, picture.pos.h, index)
        });

        let mut cache = Self::default();
        for index in order {
            match pictures[index].plane {
                plane if plane < 0 => cache.below.push(index),
                0 => cache.ground.push(index),
                _ => cache.above.push(index),
            }
        }

        let mut by_position: Vec<&Mobile> = mobiles.values().collect();
        by_position.sort_by_key(|mobile| (mobile.pos.v, mobile.pos.h, mobile.index));
        for mobile in &by_position {
            if mobile.is_dead() {
                cache.dead_mobiles.push(mobile.index);
            } else {
                cache.live_mobiles.push(mobile.index);
            }
        }
        cache.name_tags = by_position
            .iter()
            .filter(|mobile| mobile.name_tag.is_some())
            .map(|mobile| mobile.index)
            .collect();
        cache
    }

    /// Total pictures across all three buckets.
    #[must_use]
    pub fn picture_count(&self) -> usize {
        self.below.len() + self.ground.len() + self.above.len()
    }
}
