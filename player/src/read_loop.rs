//! The network read loop.

use std::io;

use scene::{Collaborators, Effects, FrameSink, StateStore};

use crate::cancel::Cancel;
use crate::config::PlayerConfig;
use crate::transport::Transport;

/// Counters for one read loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadLoopStats {
    /// Draw-state messages applied successfully.
    pub applied: u64,
    /// Draw-state messages that failed to apply.
    pub failed: u64,
    /// Messages with other tags.
    pub skipped: u64,
    /// Reads that hit the deadline.
    pub timeouts: u64,
}

/// Feeds draw-state messages from `transport` into `store` until cancelled.
///
/// Timeouts are retried; a failed frame is logged by the store and counted.
/// Cancellation is checked before every read.
///
/// # Errors
///
/// Returns the first transport error other than a timeout. The caller
/// treats it as a disconnect.
pub fn run_read_loop(
    transport: &mut dyn Transport,
    store: &StateStore,
    with: Collaborators<'_>,
    sink: &mut dyn FrameSink,
    cancel: &Cancel,
    config: &PlayerConfig,
) -> io::Result<ReadLoopStats> {
    let mut stats = ReadLoopStats::default();
    while !cancel.is_cancelled() {
        let message = match transport.recv() {
            Ok(message) => message,
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                ) =>
            {
                stats.timeouts += 1;
                continue;
            }
            Err(err) => {
                log::warn!("read loop stopping: {err}");
                return Err(err);
            }
        };

        if message.tag != config.draw_state_tag {
            log::debug!("skipping message tag {} ({} bytes)", message.tag, message.body.len());
            stats.skipped += 1;
            continue;
        }

        let mut effects = Effects::live(sink);
        match store.apply(&message.body, with, &mut effects) {
            Ok(_) => stats.applied += 1,
            Err(_) => stats.failed += 1,
        }
    }
    log::debug!("read loop cancelled after {} frames", stats.applied + stats.failed);
    Ok(stats)
}
