//! Frame-to-frame reconciliation of pictures and mobiles.
//!
//! Runs after decoding and before the store is touched. Given the previous
//! frame and the newly decoded records it rebuilds the "again" prefix,
//! decides which pictures are moving, reinserts pictures that slid off the
//! edge during a pan, and keeps vanished edge mobiles for one more frame.

use std::collections::BTreeMap;

use wire::{MobileRecord, PictureRecord};

use crate::catalog::SpriteCatalog;
use crate::error::{SceneError, SceneResult};
use crate::motion::MotionEstimate;
use crate::settings::FieldGeometry;
use crate::types::{Mobile, Picture, Point, Shift};

/// Finds which previous picture a current picture continues.
///
/// The linear scan is fine at protocol sizes; a spatial index can sit behind
/// the same interface.
pub trait PictureMatcher: Send + Sync {
    /// Returns the index in `previous` of an untaken picture with the same
    /// sprite whose position moved by exactly `shift` to reach `current`.
    fn find_match(
        &self,
        current: &Picture,
        shift: Shift,
        previous: &[Picture],
        taken: &[bool],
    ) -> Option<usize>;
}

/// Scans the previous frame in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearMatcher;

impl PictureMatcher for LinearMatcher {
    fn find_match(
        &self,
        current: &Picture,
        shift: Shift,
        previous: &[Picture],
        taken: &[bool],
    ) -> Option<usize> {
        previous.iter().enumerate().position(|(index, prev)| {
            !taken.get(index).copied().unwrap_or(true)
                && prev.sprite == current.sprite
                && prev.pos.offset(shift) == current.pos
        })
    }
}

/// Number of entries in `previous` the server actually sent.
///
/// Carried pictures are always appended after the transmitted ones.
#[must_use]
pub fn transmitted_len(previous: &[Picture]) -> usize {
    previous.iter().take_while(|picture| !picture.carried).count()
}

/// Builds the current picture list: `again` copies of the previous prefix
/// followed by the newly transmitted records.
///
/// # Errors
///
/// Returns [`SceneError::AgainOutOfRange`] if `again` exceeds what the
/// previous frame transmitted.
pub fn rebuild_pictures(
    previous: &[Picture],
    again: u8,
    records: &[PictureRecord],
    catalog: &dyn SpriteCatalog,
) -> SceneResult<Vec<Picture>> {
    let again = usize::from(again);
    let available = transmitted_len(previous);
    if again > available {
        return Err(SceneError::AgainOutOfRange { again, available });
    }

    let mut pictures = Vec::with_capacity(again + records.len());
    for prev in &previous[..again] {
        let mut copy = *prev;
        copy.prev_pos = prev.pos;
        copy.moving = false;
        copy.background = false;
        copy.again = true;
        pictures.push(copy);
    }
    for record in records {
        let pos = Point::new(record.h, record.v);
        pictures.push(Picture::new(record.sprite, pos, catalog.plane(record.sprite)));
    }
    Ok(pictures)
}

/// Marks moving/background pictures, links them to their previous
/// positions and appends edge carry-overs.
///
/// `current` must come from [`rebuild_pictures`] over the same `previous`.
pub fn reconcile_pictures(
    previous: &[Picture],
    current: &mut Vec<Picture>,
    motion: &MotionEstimate,
    catalog: &dyn SpriteCatalog,
    matcher: &dyn PictureMatcher,
    field: &FieldGeometry,
) {
    let shift = motion.accepted_shift();
    let mut taken = vec![false; previous.len()];

    for (index, picture) in current.iter_mut().enumerate() {
        if picture.again {
            taken[index] = true;
            continue;
        }
        match matcher.find_match(picture, shift, previous, &taken) {
            Some(prev) => {
                taken[prev] = true;
                picture.prev_pos = previous[prev].pos;
                picture.moving = false;
            }
            None => {
                let (width, height) = catalog
                    .sprite(picture.sprite)
                    .map_or((0, 0), |info| (info.width, info.height));
                picture.moving =
                    !field.mostly_outside(picture.pos.h, picture.pos.v, width, height);
            }
        }
    }

    for &index in &motion.background {
        if let Some(picture) = current.get_mut(index) {
            picture.background = true;
        }
    }

    if !motion.ok || shift.is_zero() {
        return;
    }

    // Edge pictures the server stopped sending during a pan. Only
    // transmitted pictures qualify, so a carry lasts one frame.
    let carried: Vec<Picture> = previous
        .iter()
        .zip(&taken)
        .filter(|&(prev, &was_taken)| !was_taken && !prev.carried && !prev.moving)
        .filter_map(|(prev, _)| {
            let pos = prev.pos.offset(shift);
            field.near_edge(pos.h, pos.v).then_some(Picture {
                pos,
                prev_pos: prev.pos,
                moving: false,
                again: false,
                carried: true,
                ..*prev
            })
        })
        .collect();
    if !carried.is_empty() {
        log::trace!("carrying {} edge pictures", carried.len());
    }
    current.extend(carried);
}

/// Builds the live mobile map from this frame's records, persisting
/// vanished edge mobiles for one extra frame.
#[must_use]
pub fn reconcile_mobiles(
    previous: &BTreeMap<u8, Mobile>,
    records: &[MobileRecord],
    motion: &MotionEstimate,
    field: &FieldGeometry,
) -> BTreeMap<u8, Mobile> {
    let mut live: BTreeMap<u8, Mobile> = BTreeMap::new();
    for record in records {
        // A repeated index replaces the earlier record.
        live.insert(
            record.index,
            Mobile {
                index: record.index,
                state: record.state,
                pos: Point::new(record.h, record.v),
                colors: record.colors,
                persist: false,
                name_tag: None,
            },
        );
    }

    let shift = motion.accepted_shift();
    for (index, prev) in previous {
        if live.contains_key(index) || prev.persist {
            continue;
        }
        if field.near_edge(prev.pos.h, prev.pos.v) {
            let mut kept = prev.clone();
            kept.pos = prev.pos.offset(shift);
            kept.persist = true;
            live.insert(*index, kept);
        }
    }
    live
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{SpriteInfo, SpriteTable};

    fn record(sprite: u16, h: i16, v: i16) -> PictureRecord {
        PictureRecord { sprite, h, v }
    }

    fn mobile_record(index: u8, h: i16, v: i16) -> MobileRecord {
        MobileRecord {
            index,
            state: 0,
            h,
            v,
            colors: 0,
        }
    }

    fn panned(dx: i16, dy: i16) -> MotionEstimate {
        MotionEstimate {
            dx,
            dy,
            background: Vec::new(),
            ok: true,
        }
    }

    #[test]
    fn again_prefix_is_copied_by_value() {
        let catalog = SpriteTable::new();
        let first = rebuild_pictures(
            &[],
            0,
            &[record(1, 10, 10), record(2, -5, 7), record(3, 0, 0)],
            &catalog,
        )
        .unwrap();
        let second = rebuild_pictures(&first, 2, &[record(9, 1, 1)], &catalog).unwrap();

        assert_eq!(second.len(), 3);
        for (rebuilt, original) in second.iter().zip(&first).take(2) {
            assert!(rebuilt.again);
            assert_eq!(rebuilt.sprite, original.sprite);
            assert_eq!(rebuilt.pos, original.pos);
        }
        assert!(!second[2].again);
        assert!(!first.iter().any(|picture| picture.again));
    }

    #[test]
    fn again_beyond_previous_is_rejected() {
        let catalog = SpriteTable::new();
        let prev = rebuild_pictures(&[], 0, &[record(1, 0, 0)], &catalog).unwrap();
        let err = rebuild_pictures(&prev, 2, &[], &catalog).unwrap_err();
        assert_eq!(
            err,
            SceneError::AgainOutOfRange {
                again: 2,
                available: 1
            }
        );
    }

    #[test]
    fn again_ignores_carried_tail() {
        let catalog = SpriteTable::new();
        let mut prev = rebuild_pictures(&[], 0, &[record(1, 0, 0)], &catalog).unwrap();
        let mut carried = prev[0];
        carried.carried = true;
        prev.push(carried);
        assert_eq!(transmitted_len(&prev), 1);
        assert!(rebuild_pictures(&prev, 2, &[], &catalog).is_err());
    }

    #[test]
    fn matched_pictures_are_static_and_linked() {
        let catalog = SpriteTable::new();
        let prev = rebuild_pictures(&[], 0, &[record(1, 0, 0), record(2, 50, 50)], &catalog)
            .unwrap();
        let mut cur =
            rebuild_pictures(&prev, 0, &[record(1, 4, 0), record(2, 90, 50)], &catalog).unwrap();
        reconcile_pictures(
            &prev,
            &mut cur,
            &panned(4, 0),
            &catalog,
            &LinearMatcher,
            &FieldGeometry::default(),
        );
        assert!(!cur[0].moving);
        assert_eq!(cur[0].prev_pos, Point::new(0, 0));
        assert!(cur[1].moving);
    }

    #[test]
    fn unmatched_offscreen_picture_is_static() {
        let catalog = SpriteTable::new().with(
            7,
            SpriteInfo {
                width: 20,
                height: 20,
                ..SpriteInfo::default()
            },
        );
        let mut cur = rebuild_pictures(&[], 0, &[record(7, 500, 0)], &catalog).unwrap();
        reconcile_pictures(
            &[],
            &mut cur,
            &MotionEstimate::none(),
            &catalog,
            &LinearMatcher,
            &FieldGeometry::default(),
        );
        assert!(!cur[0].moving);
    }

    #[test]
    fn edge_picture_is_carried_during_pan() {
        let catalog = SpriteTable::new();
        let prev = rebuild_pictures(
            &[],
            0,
            &[record(1, 0, 0), record(2, -250, 0), record(3, 0, 10)],
            &catalog,
        )
        .unwrap();
        // The view panned left by 8; sprite 2 fell off the left edge.
        let mut cur =
            rebuild_pictures(&prev, 0, &[record(1, -8, 0), record(3, -8, 10)], &catalog).unwrap();
        reconcile_pictures(
            &prev,
            &mut cur,
            &panned(-8, 0),
            &catalog,
            &LinearMatcher,
            &FieldGeometry::default(),
        );
        assert_eq!(cur.len(), 3);
        let carried = cur[2];
        assert!(carried.carried);
        assert_eq!(carried.sprite, 2);
        assert_eq!(carried.pos, Point::new(-258, 0));
        assert_eq!(carried.prev_pos, Point::new(-250, 0));
    }

    #[test]
    fn no_carry_without_motion() {
        let catalog = SpriteTable::new();
        let prev = rebuild_pictures(&[], 0, &[record(2, -250, 0)], &catalog).unwrap();
        let mut cur = rebuild_pictures(&prev, 0, &[], &catalog).unwrap();
        reconcile_pictures(
            &prev,
            &mut cur,
            &MotionEstimate::none(),
            &catalog,
            &LinearMatcher,
            &FieldGeometry::default(),
        );
        assert!(cur.is_empty());
    }

    #[test]
    fn edge_mobile_persists_one_frame() {
        let field = FieldGeometry::default();
        let first = reconcile_mobiles(
            &BTreeMap::new(),
            &[mobile_record(1, 260, 0), mobile_record(2, 0, 0)],
            &MotionEstimate::none(),
            &field,
        );
        let second = reconcile_mobiles(&first, &[], &panned(-4, 0), &field);
        assert_eq!(second.len(), 1);
        let kept = &second[&1];
        assert!(kept.persist);
        assert_eq!(kept.pos, Point::new(256, 0));

        let third = reconcile_mobiles(&second, &[], &panned(-4, 0), &field);
        assert!(third.is_empty());
    }

    #[test]
    fn duplicate_mobile_index_keeps_last() {
        let live = reconcile_mobiles(
            &BTreeMap::new(),
            &[mobile_record(4, 0, 0), mobile_record(4, 9, 9)],
            &MotionEstimate::none(),
            &FieldGeometry::default(),
        );
        assert_eq!(live.len(), 1);
        assert_eq!(live[&4].pos, Point::new(9, 9));
    }
}
