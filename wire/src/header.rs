//! Fixed-layout fields of the draw-state message.

use bitstream::BitReader;

use crate::error::{Stage, StageExt, WireResult};

/// Header size in bytes: ack command, ack frame, resend frame.
pub const HEADER_SIZE: usize = 1 + 4 + 4;

/// Size of the stat block in bytes.
pub const STATS_SIZE: usize = 7;

/// A picture count of this value introduces the extended "again" form.
pub const PICT_AGAIN_ESCAPE: u8 = 255;

/// Bit width of a picture's sprite id.
pub const PICTURE_ID_BITS: u8 = 14;

/// Bit width of a picture's signed coordinates.
pub const PICTURE_COORD_BITS: u8 = 11;

/// Acknowledgement header at the start of every draw-state message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameHeader {
    pub ack_cmd: u8,
    pub ack: u32,
    pub resend: u32,
}

impl FrameHeader {
    pub(crate) fn read(reader: &mut BitReader<'_>) -> WireResult<Self> {
        let ack_cmd = reader.read_u8().at(Stage::Header)?;
        let ack = reader.read_u32_be().at(Stage::Header)?;
        let resend = reader.read_u32_be().at(Stage::Header)?;
        Ok(Self {
            ack_cmd,
            ack,
            resend,
        })
    }
}

/// Parses only the header, for ack bookkeeping after a failed decode.
#[must_use]
pub fn peek_header(buf: &[u8]) -> Option<FrameHeader> {
    FrameHeader::read(&mut BitReader::new(buf)).ok()
}

/// The seven stat bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatBlock {
    pub hp: u8,
    pub hp_max: u8,
    pub sp: u8,
    pub sp_max: u8,
    pub balance: u8,
    pub balance_max: u8,
    pub lighting: u8,
}

impl StatBlock {
    pub(crate) fn read(reader: &mut BitReader<'_>) -> WireResult<Self> {
        let bytes = reader.read_bytes(STATS_SIZE).at(Stage::Stats)?;
        Ok(Self {
            hp: bytes[0],
            hp_max: bytes[1],
            sp: bytes[2],
            sp_max: bytes[3],
            balance: bytes[4],
            balance_max: bytes[5],
            lighting: bytes[6],
        })
    }

    /// Returns the block in wire order.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; STATS_SIZE] {
        [
            self.hp,
            self.hp_max,
            self.sp,
            self.sp_max,
            self.balance,
            self.balance_max,
            self.lighting,
        ]
    }
}

/// Bubble type byte: a kind in the low six bits plus two flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BubbleFlags(u8);

impl BubbleFlags {
    /// Mask selecting the bubble kind.
    pub const KIND_MASK: u8 = 0x3F;

    /// A language byte follows the type byte.
    pub const NOT_COMMON: u8 = 0x40;

    /// A fixed h/v position follows; the bubble is not anchored to its owner.
    pub const FAR: u8 = 0x80;

    /// Creates flags from a raw value.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw type byte.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Returns the bubble kind.
    #[must_use]
    pub const fn kind(self) -> BubbleKind {
        BubbleKind::from_raw(self.0 & Self::KIND_MASK)
    }

    /// Returns `true` if a language byte follows.
    #[must_use]
    pub const fn is_not_common(self) -> bool {
        self.0 & Self::NOT_COMMON != 0
    }

    /// Returns `true` if a fixed position follows.
    #[must_use]
    pub const fn is_far(self) -> bool {
        self.0 & Self::FAR != 0
    }
}

/// What a bubble represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BubbleKind {
    Normal,
    Whisper,
    Yell,
    Thought,
    RealAction,
    Monster,
    PlayerAction,
    Ponder,
    Narrate,
    Unknown(u8),
}

impl BubbleKind {
    /// Maps the low six bits of a type byte to a kind.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Normal,
            1 => Self::Whisper,
            2 => Self::Yell,
            3 => Self::Thought,
            4 => Self::RealAction,
            5 => Self::Monster,
            6 => Self::PlayerAction,
            7 => Self::Ponder,
            8 => Self::Narrate,
            other => Self::Unknown(other),
        }
    }

    /// Returns the low-six-bit wire value.
    #[must_use]
    pub const fn raw(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Whisper => 1,
            Self::Yell => 2,
            Self::Thought => 3,
            Self::RealAction => 4,
            Self::Monster => 5,
            Self::PlayerAction => 6,
            Self::Ponder => 7,
            Self::Narrate => 8,
            Self::Unknown(raw) => raw,
        }
    }
}
