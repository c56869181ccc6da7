//! Recorded-session playback.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use scene::{
    CheckpointedTimeline, Collaborators, Effects, FrameSink, FrameSummary, PlayerRegistry,
    SceneResult, SeekReport, SpriteCatalog, StateStore,
};

use crate::cancel::Cancel;
use crate::config::PlayerConfig;

/// Plays a recorded session into a [`StateStore`], with seeking.
///
/// The playhead lock makes a ticker step and a seek mutually exclusive, so a
/// step never applies a frame against a state a seek just replaced.
pub struct MoviePlayer {
    store: Arc<StateStore>,
    timeline: CheckpointedTimeline,
    frames: Vec<Vec<u8>>,
    sprites: Arc<dyn SpriteCatalog>,
    players: Arc<dyn PlayerRegistry>,
    config: PlayerConfig,
    playhead: Mutex<()>,
}

impl MoviePlayer {
    /// Creates a player positioned before the first frame.
    ///
    /// The timeline's frame 0 is whatever `store` holds now, with its frame
    /// counter rewound so the first step plays the first recorded frame.
    pub fn new(
        store: Arc<StateStore>,
        frames: Vec<Vec<u8>>,
        sprites: Arc<dyn SpriteCatalog>,
        players: Arc<dyn PlayerRegistry>,
        config: PlayerConfig,
        timeline: scene::TimelineConfig,
    ) -> Self {
        let mut initial = store.capture();
        initial.frame = 0;
        store.restore(initial.clone());
        let timeline = CheckpointedTimeline::starting_from(timeline, initial);
        Self {
            store,
            timeline,
            frames,
            sprites,
            players,
            config,
            playhead: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    #[must_use]
    pub const fn timeline(&self) -> &CheckpointedTimeline {
        &self.timeline
    }

    /// Number of frames in the recording.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.frames.len() as u64
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames played so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.store.frame()
    }

    #[must_use]
    pub fn at_end(&self) -> bool {
        self.position() >= self.len()
    }

    fn collaborators(&self) -> Collaborators<'_> {
        Collaborators::new(&*self.sprites, &*self.players)
    }

    /// Applies the next frame with live effects and records a checkpoint
    /// on interval boundaries. Returns `None` at the end of the recording.
    pub fn step(&self, sink: &mut dyn FrameSink) -> Option<SceneResult<FrameSummary>> {
        let _playhead = self.playhead.lock();
        let next = usize::try_from(self.store.frame()).ok()?;
        let bytes = self.frames.get(next)?;
        let mut effects = Effects::live(sink);
        let result = self.store.apply(bytes, self.collaborators(), &mut effects);
        self.timeline.record(&self.store);
        Some(result)
    }

    /// Jumps to the state after `target` frames.
    pub fn seek(&self, target: u64) -> SeekReport {
        let _playhead = self.playhead.lock();
        self.timeline
            .seek(&self.store, &self.frames, target, self.collaborators())
    }

    /// Steps on a background thread every `frame_interval` until the end of
    /// the recording or until `cancel` fires. Returns frames stepped.
    pub fn spawn_ticker(
        self: &Arc<Self>,
        mut sink: Box<dyn FrameSink + Send>,
        cancel: Cancel,
    ) -> JoinHandle<u64> {
        let player = Arc::clone(self);
        thread::spawn(move || {
            let mut stepped = 0;
            while !cancel.is_cancelled() {
                if player.step(sink.as_mut()).is_none() {
                    log::debug!("movie reached its end at frame {}", player.position());
                    break;
                }
                stepped += 1;
                thread::sleep(player.config.frame_interval);
            }
            stepped
        })
    }
}

impl std::fmt::Debug for MoviePlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoviePlayer")
            .field("frames", &self.frames.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
