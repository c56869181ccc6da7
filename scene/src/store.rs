//! The shared, lock-guarded scene.

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::effects::Effects;
use crate::error::SceneResult;
use crate::settings::{SceneConfig, Settings};
use crate::snapshot::Snapshot;
use crate::state::{Collaborators, DrawState, FrameSummary};

/// One session's scene, shared by its network task, movie ticker and renderer.
///
/// Frames are decoded under the state lock, so no two frames ever interleave.
/// Readers copy out a [`Snapshot`] and release the lock before drawing.
///
/// Lock order is state, then config.
#[derive(Debug, Default)]
pub struct StateStore {
    state: Mutex<DrawState>,
    config: RwLock<SceneConfig>,
}

impl StateStore {
    #[must_use]
    pub fn new(config: SceneConfig) -> Self {
        Self {
            state: Mutex::new(DrawState::new()),
            config: RwLock::new(config),
        }
    }

    /// Applies one draw-state message as the next frame.
    ///
    /// # Errors
    ///
    /// See [`DrawState::apply`]. The failure has already been logged and
    /// the ack bookkeeping updated.
    pub fn apply(
        &self,
        bytes: &[u8],
        with: Collaborators<'_>,
        effects: &mut Effects<'_>,
    ) -> SceneResult<FrameSummary> {
        let mut state = self.state.lock();
        let config = self.config.read();
        state.apply(bytes, &config, with, effects)
    }

    /// Copies what a render pass needs.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.lock();
        let config = self.config.read();
        Snapshot::capture(&state, &config.settings)
    }

    /// Clones the whole state.
    #[must_use]
    pub fn capture(&self) -> DrawState {
        self.state.lock().clone()
    }

    /// Replaces the whole state.
    pub fn restore(&self, state: DrawState) {
        *self.state.lock() = state;
    }

    /// Frames processed so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.state.lock().frame
    }

    /// Runs `f` against the state under the lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&DrawState) -> R) -> R {
        f(&self.state.lock())
    }

    /// Returns a copy of the current settings.
    #[must_use]
    pub fn settings(&self) -> Settings {
        self.config.read().settings.clone()
    }

    /// Replaces the live settings; the next frame uses them.
    pub fn set_settings(&self, settings: Settings) {
        self.config.write().settings = settings;
    }

    /// Returns a copy of the full configuration.
    #[must_use]
    pub fn config(&self) -> SceneConfig {
        self.config.read().clone()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, DrawState> {
        self.state.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PlayerList, SpriteTable};
    use crate::effects::NullSink;
    use std::sync::Arc;
    use std::thread;
    use wire::{encode_draw_message, DrawMessage};

    #[test]
    fn concurrent_applies_never_interleave() {
        let store = Arc::new(StateStore::new(SceneConfig::for_testing()));
        let bytes = Arc::new(encode_draw_message(&DrawMessage::default()).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let bytes = Arc::clone(&bytes);
                thread::spawn(move || {
                    let sprites = SpriteTable::new();
                    let players = PlayerList::new();
                    let mut sink = NullSink;
                    for _ in 0..25 {
                        let mut effects = Effects::live(&mut sink);
                        store
                            .apply(&bytes, Collaborators::new(&sprites, &players), &mut effects)
                            .unwrap();
                        let _ = store.snapshot();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.frame(), 100);
    }

    #[test]
    fn restore_replaces_state() {
        let store = StateStore::default();
        let mut state = DrawState::new();
        state.frame = 42;
        store.restore(state.clone());
        assert_eq!(store.capture(), state);
        assert_eq!(store.snapshot().frame, 42);
    }

    #[test]
    fn settings_update_is_visible() {
        let store = StateStore::default();
        let mut settings = store.settings();
        settings.show_yell = false;
        store.set_settings(settings);
        assert!(!store.settings().show_yell);
    }
}
