//! Read-only copies of the scene for rendering.

use std::collections::{BTreeMap, HashSet};

use crate::cache::RenderCache;
use crate::settings::Settings;
use crate::state::DrawState;
use crate::types::{Bubble, Descriptor, Item, Mobile, Picture, Shift, Stats};

/// Everything one render pass needs, detached from the live store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    pub frame: u64,
    pub descriptors: BTreeMap<u8, Descriptor>,
    pub pictures: Vec<Picture>,
    pub mobiles: BTreeMap<u8, Mobile>,
    pub prev_mobiles: BTreeMap<u8, Mobile>,
    pub stats: Stats,
    pub prev_stats: Stats,
    /// Unexpired bubbles, newest per owner, oldest first.
    pub bubbles: Vec<Bubble>,
    pub info_text: String,
    pub inventory: Vec<Item>,
    /// Pan since the previous frame.
    pub shift: Shift,
    /// Whether the renderer should tween between previous and current positions.
    pub interpolate: bool,
    pub cache: RenderCache,
}

impl Snapshot {
    /// Deep-copies what a render pass needs out of `state`.
    #[must_use]
    pub fn capture(state: &DrawState, settings: &Settings) -> Self {
        Self {
            frame: state.frame,
            descriptors: state.descriptors.clone(),
            pictures: state.pictures.clone(),
            mobiles: state.mobiles.clone(),
            prev_mobiles: state.prev_mobiles.clone(),
            stats: state.stats,
            prev_stats: state.prev_stats,
            bubbles: live_bubbles(&state.bubbles, state.frame),
            info_text: state.info_text.clone(),
            inventory: state.inventory.items().to_vec(),
            shift: state.motion.shift(),
            interpolate: settings.smooth_motion && state.motion.ok,
            cache: state.cache.clone(),
        }
    }

    /// Pictures in back-to-front draw order.
    pub fn pictures_in_order(&self) -> impl Iterator<Item = &Picture> {
        self.cache
            .below
            .iter()
            .chain(&self.cache.ground)
            .chain(&self.cache.above)
            .filter_map(|&index| self.pictures.get(index))
    }

    /// Display name for a mobile or bubble owner.
    #[must_use]
    pub fn name_of(&self, index: u8) -> Option<&str> {
        self.descriptors.get(&index).map(|desc| desc.name.as_str())
    }
}

/// Drops bubbles whose age at `frame` has reached their lifetime and keeps
/// only the newest bubble per owner.
#[must_use]
pub fn live_bubbles(bubbles: &[Bubble], frame: u64) -> Vec<Bubble> {
    let mut seen = HashSet::new();
    let mut live: Vec<Bubble> = bubbles
        .iter()
        .rev()
        .filter(|bubble| !bubble.is_expired(frame))
        .filter(|bubble| seen.insert(bubble.owner))
        .cloned()
        .collect();
    live.reverse();
    live
}
