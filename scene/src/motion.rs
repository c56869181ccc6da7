//! Picture-shift detection.
//!
//! The protocol never says that the view panned. It only sends absolute
//! picture positions, so a pan has to be inferred from how the same sprites
//! moved between two frames. Each previous picture votes for the displacement
//! to its nearest same-sprite successor, weighted by how much of the screen
//! the sprite covers. A clear majority wins.

use std::collections::{BTreeMap, HashMap};

use crate::catalog::SpriteCatalog;
use crate::settings::MotionConfig;
use crate::types::{Picture, Shift};

/// Runner-up share (in percent of total weight) that overrides a zero-vector winner.
const RUNNER_UP_PERCENT: u64 = 40;

/// Result of comparing two frames' pictures.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionEstimate {
    pub dx: i16,
    pub dy: i16,
    /// Current-frame picture indices that moved with the winning vector and
    /// are heavy enough to count as background.
    pub background: Vec<usize>,
    pub ok: bool,
}

impl MotionEstimate {
    /// An estimate with no consensus.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            dx: 0,
            dy: 0,
            background: Vec::new(),
            ok: false,
        }
    }

    #[must_use]
    pub const fn shift(&self) -> Shift {
        Shift::new(self.dx, self.dy)
    }

    /// The shift when the estimate succeeded, zero otherwise.
    #[must_use]
    pub const fn accepted_shift(&self) -> Shift {
        if self.ok {
            self.shift()
        } else {
            Shift::ZERO
        }
    }
}

struct Vote {
    current: usize,
    shift: Shift,
    pixels: u32,
}

/// Estimates the whole-view shift from `previous` to `current`.
///
/// Degrades to [`MotionEstimate::none`] when nothing votes, when no vector
/// holds a majority, or when the winner is longer than `config.max_shift`.
#[must_use]
pub fn estimate_motion(
    previous: &[Picture],
    current: &[Picture],
    catalog: &dyn SpriteCatalog,
    config: &MotionConfig,
) -> MotionEstimate {
    let mut by_sprite: HashMap<u16, Vec<usize>> = HashMap::new();
    for (index, picture) in current.iter().enumerate() {
        if !config.is_excluded(picture.sprite) {
            by_sprite.entry(picture.sprite).or_default().push(index);
        }
    }

    let mut votes = Vec::new();
    for prev in previous {
        if config.is_excluded(prev.sprite) {
            continue;
        }
        let Some(candidates) = by_sprite.get(&prev.sprite) else {
            continue;
        };
        let nearest = candidates
            .iter()
            .copied()
            .min_by_key(|&index| (prev.pos.distance_sq(current[index].pos), index));
        let Some(index) = nearest else {
            continue;
        };
        let pixels = catalog.pixel_count(prev.sprite);
        if pixels == 0 {
            continue;
        }
        votes.push(Vote {
            current: index,
            shift: Shift::between(prev.pos, current[index].pos),
            pixels,
        });
    }

    let mut tally: BTreeMap<Shift, u64> = BTreeMap::new();
    let mut total: u64 = 0;
    for vote in &votes {
        let weight = u64::from(vote.pixels.min(config.weight_cap));
        *tally.entry(vote.shift).or_insert(0) += weight;
        total += weight;
    }
    if total == 0 {
        return MotionEstimate::none();
    }

    // Heaviest first; on equal weight the zero vector ranks first so the
    // runner-up rule below gets a chance to override it.
    let mut ranked: Vec<(Shift, u64)> = tally.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| b.0.is_zero().cmp(&a.0.is_zero()))
            .then_with(|| a.0.cmp(&b.0))
    });

    let (top, top_weight) = ranked[0];
    let winner = match ranked.get(1) {
        Some(&(runner, runner_weight))
            if top.is_zero() && runner_weight * 100 >= total * RUNNER_UP_PERCENT =>
        {
            runner
        }
        _ if top_weight * 2 > total => top,
        _ => {
            log::debug!("no motion consensus: top {top:?} holds {top_weight} of {total}");
            return MotionEstimate::none();
        }
    };

    let max = i64::from(config.max_shift);
    if winner.magnitude_sq() > max * max {
        log::debug!("rejecting shift {winner:?}: longer than {}", config.max_shift);
        return MotionEstimate::none();
    }

    let mut background: Vec<usize> = votes
        .iter()
        .filter(|vote| vote.shift == winner && vote.pixels >= config.min_background_weight)
        .map(|vote| vote.current)
        .collect();
    background.sort_unstable();
    background.dedup();

    MotionEstimate {
        dx: winner.dx,
        dy: winner.dy,
        background,
        ok: true,
    }
}
