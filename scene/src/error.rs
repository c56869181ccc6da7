//! Error types for applying frames to the scene.

use std::fmt;

use wire::{DecodeError, Stage};

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Why a frame could not be applied.
///
/// Either way the frame counter has advanced and the ack bookkeeping has been
/// updated; the rest of the state is untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The message failed to decode.
    Decode(DecodeError),

    /// The message repeats more pictures than the previous frame sent.
    AgainOutOfRange { again: usize, available: usize },
}

impl SceneError {
    /// Returns the decode stage that failed, if this is a decode failure.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::Decode(err) => Some(err.stage),
            Self::AgainOutOfRange { .. } => None,
        }
    }
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(err) => write!(f, "decode failed: {err}"),
            Self::AgainOutOfRange { again, available } => write!(
                f,
                "message repeats {again} pictures but the previous frame sent {available}"
            ),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(err) => Some(err),
            Self::AgainOutOfRange { .. } => None,
        }
    }
}

impl From<DecodeError> for SceneError {
    fn from(err: DecodeError) -> Self {
        Self::Decode(err)
    }
}
