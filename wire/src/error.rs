//! Error types for draw-state message decoding and encoding.

use std::fmt;

use bitstream::BitError;

/// Result type for wire decoding.
pub type WireResult<T> = Result<T, DecodeError>;

/// Decoding stage, in the order stages run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Header,
    Descriptors,
    Stats,
    PictureCount,
    Pictures,
    Mobiles,
    StateBlock,
    InfoText,
    Bubbles,
    Sounds,
    Inventory,
}

impl Stage {
    /// Returns the stage name used in logs and tool output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Descriptors => "descriptors",
            Self::Stats => "stats",
            Self::PictureCount => "picture count",
            Self::Pictures => "pictures",
            Self::Mobiles => "mobiles",
            Self::StateBlock => "state block",
            Self::InfoText => "info text",
            Self::Bubbles => "bubbles",
            Self::Sounds => "sounds",
            Self::Inventory => "inventory",
        }
    }
}

/// A decode failure tagged with the stage that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub stage: Stage,
    pub kind: DecodeErrorKind,
}

/// What went wrong inside a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// Buffer shorter than the stage needs.
    Truncated { requested: usize, available: usize },

    /// Declared count exceeds its ceiling.
    CorruptCount {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },

    /// A field inside a record is malformed.
    MalformedSubfield(SubfieldError),

    /// Bytes remain after the stage that should have consumed them.
    TrailingBytes { remaining: usize },
}

/// Ceilings that a declared count can exceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    MessageBytes,
    Descriptors,
    Colors,
    Pictures,
    Mobiles,
    Bubbles,
    Sounds,
    InventoryItems,
}

/// Malformed-subfield details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubfieldError {
    /// A NUL-terminated string had no terminator.
    MissingTerminator { scanned: usize },
    /// An inventory opcode that cannot appear at this point.
    UnknownInventoryOpcode { opcode: u8 },
    /// A multiple-command wrapper named a base opcode that cannot repeat.
    InvalidMultipleBase { opcode: u8 },
    /// Inventory slot indices are 1-based.
    ZeroSlotIndex,
    /// Internal bitstream misuse (misaligned access, bad width).
    Bitstream(BitError),
}

/// Errors that can occur while encoding a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A list is too long for its one-byte count.
    CountOverflow { kind: LimitKind, count: usize },
    /// The trailing state block exceeds its two-byte length.
    StateBlockTooLarge { len: usize },
    /// A field did not fit its bit width.
    Bitstream(BitError),
}

impl DecodeError {
    pub(crate) const fn new(stage: Stage, kind: DecodeErrorKind) -> Self {
        Self { stage, kind }
    }

    /// Wraps a bitstream failure, classifying overruns as truncation.
    pub(crate) fn from_bits(stage: Stage, err: BitError) -> Self {
        let kind = match err {
            BitError::UnexpectedEof {
                requested,
                available,
            } => DecodeErrorKind::Truncated {
                requested,
                available,
            },
            BitError::MissingTerminator { scanned } => {
                DecodeErrorKind::MalformedSubfield(SubfieldError::MissingTerminator { scanned })
            }
            other => DecodeErrorKind::MalformedSubfield(SubfieldError::Bitstream(other)),
        };
        Self { stage, kind }
    }

    pub(crate) const fn corrupt_count(
        stage: Stage,
        kind: LimitKind,
        limit: usize,
        actual: usize,
    ) -> Self {
        Self::new(
            stage,
            DecodeErrorKind::CorruptCount {
                kind,
                limit,
                actual,
            },
        )
    }

    /// Returns `true` if the message was cut short.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        matches!(self.kind, DecodeErrorKind::Truncated { .. })
    }
}

/// Tags bitstream results with the current stage.
pub(crate) trait StageExt<T> {
    fn at(self, stage: Stage) -> WireResult<T>;
}

impl<T> StageExt<T> for Result<T, BitError> {
    fn at(self, stage: Stage) -> WireResult<T> {
        self.map_err(|err| DecodeError::from_bits(stage, err))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stage: {}", self.stage, self.kind)
    }
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated {
                requested,
                available,
            } => {
                write!(
                    f,
                    "truncated packet: need {requested} bits, {available} available"
                )
            }
            Self::CorruptCount {
                kind,
                limit,
                actual,
            } => {
                write!(f, "corrupt {kind} count: {actual} > {limit}")
            }
            Self::MalformedSubfield(err) => write!(f, "malformed subfield: {err}"),
            Self::TrailingBytes { remaining } => {
                write!(f, "{remaining} trailing bytes")
            }
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MessageBytes => "message bytes",
            Self::Descriptors => "descriptor",
            Self::Colors => "color",
            Self::Pictures => "picture",
            Self::Mobiles => "mobile",
            Self::Bubbles => "bubble",
            Self::Sounds => "sound",
            Self::InventoryItems => "inventory item",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for SubfieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTerminator { scanned } => {
                write!(f, "missing string terminator after {scanned} bytes")
            }
            Self::UnknownInventoryOpcode { opcode } => {
                write!(f, "unknown inventory opcode 0x{opcode:02X}")
            }
            Self::InvalidMultipleBase { opcode } => {
                write!(f, "opcode 0x{opcode:02X} cannot be repeated")
            }
            Self::ZeroSlotIndex => write!(f, "slot index 0 (slots are 1-based)"),
            Self::Bitstream(err) => write!(f, "{err}"),
        }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CountOverflow { kind, count } => {
                write!(f, "{count} {kind} entries do not fit a one-byte count")
            }
            Self::StateBlockTooLarge { len } => {
                write!(f, "state block of {len} bytes exceeds 65535")
            }
            Self::Bitstream(err) => write!(f, "bitstream error: {err}"),
        }
    }
}

impl From<BitError> for EncodeError {
    fn from(err: BitError) -> Self {
        Self::Bitstream(err)
    }
}

impl std::error::Error for DecodeError {}

impl std::error::Error for EncodeError {}
