//! Player configuration.

use std::time::Duration;

/// Message tag of the draw-state message.
pub const DRAW_STATE_TAG: u16 = 2;

/// Timing and framing parameters for read loops and movie playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    /// How long a socket read blocks before the loop rechecks cancellation.
    pub read_timeout: Duration,
    /// Time between movie frames.
    pub frame_interval: Duration,
    /// Tag routed to the draw-state decoder; other tags are skipped.
    pub draw_state_tag: u16,
    /// Largest accepted frame body.
    pub max_frame_bytes: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(250),
            frame_interval: Duration::from_millis(125),
            draw_state_tag: DRAW_STATE_TAG,
            max_frame_bytes: usize::from(u16::MAX),
        }
    }
}

impl PlayerConfig {
    /// Short timeouts so tests finish quickly.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            read_timeout: Duration::from_millis(20),
            frame_interval: Duration::from_millis(1),
            ..Self::default()
        }
    }
}
