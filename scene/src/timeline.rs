//! Checkpointed, seekable playback of recorded frames.
//!
//! Every `interval` frames the whole [`DrawState`] is stored by value. A seek
//! restores the newest checkpoint at or before the target and silently
//! re-applies the frames in between, so it costs at most one interval of
//! decoding and lands on exactly the state sequential playback would reach.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::effects::{EffectMode, Effects, NullSink};
use crate::settings::TimelineConfig;
use crate::state::{Collaborators, DrawState};
use crate::store::StateStore;

/// A full state copy taken after `frame` frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub frame: u64,
    pub state: DrawState,
}

/// Outcome of a seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekReport {
    /// The frame reached, after clamping to the recording length.
    pub target: u64,
    /// The checkpoint the replay started from.
    pub from: u64,
    /// Frames re-applied.
    pub replayed: u64,
    /// Frames that failed to apply and were skipped.
    pub failures: u64,
}

/// Clears the seeking flag on every exit path.
struct SeekingGuard<'a>(&'a AtomicBool);

impl<'a> SeekingGuard<'a> {
    fn engage(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for SeekingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Ordered checkpoints plus seek serialization.
///
/// Locks are taken in the order seek, store state, checkpoints.
#[derive(Debug)]
pub struct CheckpointedTimeline {
    config: TimelineConfig,
    checkpoints: Mutex<Vec<Checkpoint>>,
    seek_lock: Mutex<()>,
    seeking: Arc<AtomicBool>,
}

impl Default for CheckpointedTimeline {
    fn default() -> Self {
        Self::new(TimelineConfig::default())
    }
}

impl CheckpointedTimeline {
    /// Creates a timeline whose frame 0 is the empty state.
    #[must_use]
    pub fn new(config: TimelineConfig) -> Self {
        Self::starting_from(config, DrawState::new())
    }

    /// Creates a timeline whose frame 0 is `initial`.
    ///
    /// The frame counter of `initial` is reset to 0 so replays count from it.
    #[must_use]
    pub fn starting_from(config: TimelineConfig, mut initial: DrawState) -> Self {
        initial.frame = 0;
        Self {
            config,
            checkpoints: Mutex::new(vec![Checkpoint {
                frame: 0,
                state: initial,
            }]),
            seek_lock: Mutex::new(()),
            seeking: Arc::new(AtomicBool::new(false)),
        }
    }

    fn interval(&self) -> u64 {
        self.config.interval.max(1)
    }

    /// Returns `true` while a seek is replaying frames.
    #[must_use]
    pub fn is_seeking(&self) -> bool {
        self.seeking.load(Ordering::Acquire)
    }

    /// Shared flag a renderer can poll to skip drawing during a seek.
    #[must_use]
    pub fn seeking_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.seeking)
    }

    /// Frames that currently have a checkpoint, ascending.
    #[must_use]
    pub fn checkpoint_frames(&self) -> Vec<u64> {
        self.checkpoints.lock().iter().map(|cp| cp.frame).collect()
    }

    /// Returns the newest checkpoint at or before `frame`.
    #[must_use]
    pub fn latest_at_or_before(&self, frame: u64) -> Option<Checkpoint> {
        let checkpoints = self.checkpoints.lock();
        let end = checkpoints.partition_point(|cp| cp.frame <= frame);
        end.checked_sub(1).map(|index| checkpoints[index].clone())
    }

    /// Stores `state` as the checkpoint for its frame unless one exists.
    fn insert(&self, state: &DrawState) -> bool {
        let mut checkpoints = self.checkpoints.lock();
        match checkpoints.binary_search_by_key(&state.frame, |cp| cp.frame) {
            Ok(_) => false,
            Err(index) => {
                checkpoints.insert(
                    index,
                    Checkpoint {
                        frame: state.frame,
                        state: state.clone(),
                    },
                );
                true
            }
        }
    }

    /// Captures a checkpoint if the store sits on an interval boundary.
    ///
    /// Call after each frame of sequential playback.
    pub fn record(&self, store: &StateStore) -> bool {
        let interval = self.interval();
        let state = store.lock();
        if state.frame % interval != 0 {
            return false;
        }
        let added = self.insert(&state);
        if added {
            log::debug!("checkpoint at frame {}", state.frame);
        }
        added
    }

    /// Moves `store` to the state after `target` frames of `frames`.
    ///
    /// `frames[i]` is the message that produces frame `i + 1`. The target is
    /// clamped to the recording length. Failing frames are skipped but still
    /// count as frames. Checkpoints are added for boundaries crossed on the way.
    pub fn seek<F: AsRef<[u8]>>(
        &self,
        store: &StateStore,
        frames: &[F],
        target: u64,
        with: Collaborators<'_>,
    ) -> SeekReport {
        let _serial = self.seek_lock.lock();
        let _seeking = SeekingGuard::engage(&self.seeking);

        let target = target.min(frames.len() as u64);
        let interval = self.interval();
        let config = store.config();

        let mut state = store.lock();
        let (from, restored) = self
            .latest_at_or_before(target)
            .map_or_else(|| (0, DrawState::new()), |cp| (cp.frame, cp.state));
        *state = restored;

        let mut sink = NullSink;
        let mut effects = Effects::new(&mut sink, EffectMode::Silent);
        let mut failures = 0;
        for (offset, bytes) in frames[from as usize..target as usize].iter().enumerate() {
            if let Err(err) = state.apply(bytes.as_ref(), &config, with, &mut effects) {
                failures += 1;
                log::debug!("seek: skipping frame {}: {err}", from + offset as u64 + 1);
            }
            if state.frame % interval == 0 {
                self.insert(&state);
            }
        }

        let report = SeekReport {
            target,
            from,
            replayed: target - from,
            failures,
        };
        log::info!(
            "seek to frame {} from checkpoint {} ({} replayed, {} skipped)",
            report.target,
            report.from,
            report.replayed,
            report.failures
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PlayerList, SpriteTable};
    use crate::settings::SceneConfig;
    use wire::{encode_draw_message, DrawMessage, FrameHeader};

    fn frames(count: u32) -> Vec<Vec<u8>> {
        (1..=count)
            .map(|n| {
                encode_draw_message(&DrawMessage {
                    header: FrameHeader {
                        ack_cmd: 0,
                        ack: n,
                        resend: n + 1,
                    },
                    info_text: format!("frame {n}"),
                    ..DrawMessage::default()
                })
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn seek_lands_on_target_and_adds_checkpoints() {
        let timeline = CheckpointedTimeline::new(TimelineConfig::for_testing());
        let store = StateStore::new(SceneConfig::for_testing());
        let sprites = SpriteTable::new();
        let players = PlayerList::new();
        let recording = frames(10);

        let report = timeline.seek(&store, &recording, 10, Collaborators::new(&sprites, &players));
        assert_eq!(report.from, 0);
        assert_eq!(report.replayed, 10);
        assert_eq!(report.failures, 0);
        assert_eq!(store.frame(), 10);
        assert_eq!(store.capture().ack.ack, 10);
        assert_eq!(timeline.checkpoint_frames(), vec![0, 4, 8]);

        let report = timeline.seek(&store, &recording, 6, Collaborators::new(&sprites, &players));
        assert_eq!(report.from, 4);
        assert_eq!(report.replayed, 2);
        assert_eq!(store.capture().info_text, "frame 6");
        assert!(!timeline.is_seeking());
    }

    #[test]
    fn target_is_clamped() {
        let timeline = CheckpointedTimeline::new(TimelineConfig::for_testing());
        let store = StateStore::new(SceneConfig::for_testing());
        let sprites = SpriteTable::new();
        let players = PlayerList::new();
        let report = timeline.seek(&store, &frames(3), 50, Collaborators::new(&sprites, &players));
        assert_eq!(report.target, 3);
        assert_eq!(store.frame(), 3);
    }

    #[test]
    fn failing_frames_are_skipped_but_counted() {
        let timeline = CheckpointedTimeline::new(TimelineConfig::for_testing());
        let store = StateStore::new(SceneConfig::for_testing());
        let sprites = SpriteTable::new();
        let players = PlayerList::new();
        let mut recording = frames(5);
        recording[2] = vec![0xFF];

        let report = timeline.seek(&store, &recording, 5, Collaborators::new(&sprites, &players));
        assert_eq!(report.failures, 1);
        assert_eq!(store.frame(), 5);
        assert_eq!(store.capture().info_text, "frame 5");
    }

    #[test]
    fn record_only_on_boundaries() {
        let timeline = CheckpointedTimeline::new(TimelineConfig::for_testing());
        let store = StateStore::new(SceneConfig::for_testing());
        let mut state = DrawState::new();
        state.frame = 3;
        store.restore(state.clone());
        assert!(!timeline.record(&store));
        state.frame = 4;
        store.restore(state);
        assert!(timeline.record(&store));
        assert!(!timeline.record(&store));
        assert_eq!(timeline.checkpoint_frames(), vec![0, 4]);
    }

    #[test]
    fn timeline_over_advanced_state_counts_from_zero() {
        let store = StateStore::new(SceneConfig::for_testing());
        let sprites = SpriteTable::new();
        let players = PlayerList::new();
        let warmup = frames(2);
        let mut sink = NullSink;
        for bytes in &warmup {
            let mut effects = Effects::live(&mut sink);
            store
                .apply(bytes, Collaborators::new(&sprites, &players), &mut effects)
                .unwrap();
        }
        assert_eq!(store.frame(), 2);

        let timeline =
            CheckpointedTimeline::starting_from(TimelineConfig::for_testing(), store.capture());
        assert_eq!(timeline.checkpoint_frames(), vec![0]);
        let recording = frames(6);
        let report = timeline.seek(&store, &recording, 3, Collaborators::new(&sprites, &players));
        assert_eq!(report.target, 3);
        assert_eq!(store.frame(), report.target);
        assert_eq!(store.capture().info_text, "frame 3");
    }

    #[test]
    fn guard_clears_flag_on_unwind() {
        let flag = AtomicBool::new(false);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = SeekingGuard::engage(&flag);
            assert!(flag.load(Ordering::Acquire));
            panic!("replay aborted");
        }));
        assert!(result.is_err());
        assert!(!flag.load(Ordering::Acquire));
    }
}
