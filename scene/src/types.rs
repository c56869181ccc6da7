//! Scene model types.

use wire::{BubbleKind, StatBlock};

/// Screen position in field coordinates, origin at the field center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub h: i16,
    pub v: i16,
}

impl Point {
    #[must_use]
    pub const fn new(h: i16, v: i16) -> Self {
        Self { h, v }
    }

    /// Returns this point moved by `shift`, saturating at the i16 range.
    #[must_use]
    pub const fn offset(self, shift: Shift) -> Self {
        Self {
            h: self.h.saturating_add(shift.dx),
            v: self.v.saturating_add(shift.dy),
        }
    }

    /// Squared Euclidean distance.
    #[must_use]
    pub fn distance_sq(self, other: Self) -> i64 {
        let dh = i64::from(self.h) - i64::from(other.h);
        let dv = i64::from(self.v) - i64::from(other.v);
        dh * dh + dv * dv
    }
}

/// A whole-view displacement between two frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shift {
    pub dx: i16,
    pub dy: i16,
}

impl Shift {
    pub const ZERO: Self = Self { dx: 0, dy: 0 };

    #[must_use]
    pub const fn new(dx: i16, dy: i16) -> Self {
        Self { dx, dy }
    }

    /// Displacement from `from` to `to`.
    #[must_use]
    pub const fn between(from: Point, to: Point) -> Self {
        Self {
            dx: to.h.wrapping_sub(from.h),
            dy: to.v.wrapping_sub(from.v),
        }
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    #[must_use]
    pub fn magnitude_sq(self) -> i64 {
        let dx = i64::from(self.dx);
        let dy = i64::from(self.dy);
        dx * dx + dy * dy
    }
}

/// What a descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DescriptorKind {
    Player,
    Monster,
    Npc,
    Other(u8),
}

impl DescriptorKind {
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Player,
            1 => Self::Monster,
            2 => Self::Npc,
            other => Self::Other(other),
        }
    }
}

/// Server-assigned metadata for a visible object.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Descriptor {
    pub index: u8,
    pub kind: DescriptorKind,
    pub sprite: u16,
    pub name: String,
    pub colors: Vec<u8>,
    pub plane: i16,
}

impl Descriptor {
    /// Returns `true` if sprite, colors or name differ from `other`.
    #[must_use]
    pub fn appearance_differs(&self, other: &Self) -> bool {
        self.sprite != other.sprite || self.colors != other.colors || self.name != other.name
    }
}

/// A positioned environment sprite for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Picture {
    pub sprite: u16,
    pub pos: Point,
    pub prev_pos: Point,
    pub plane: i16,
    pub moving: bool,
    pub background: bool,
    /// Copied from the previous frame's prefix.
    pub again: bool,
    /// Reinserted at the field edge; not part of the server's list.
    pub carried: bool,
}

impl Picture {
    /// A freshly transmitted picture with no history yet.
    #[must_use]
    pub const fn new(sprite: u16, pos: Point, plane: i16) -> Self {
        Self {
            sprite,
            pos,
            prev_pos: pos,
            plane,
            moving: false,
            background: false,
            again: false,
            carried: false,
        }
    }
}

/// Pose byte for a dead mobile.
pub const POSE_DEAD: u8 = 32;

/// Everything a name tag image depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NameTagKey {
    pub name: String,
    pub colors: u8,
    pub dead: bool,
}

/// A positioned, animated character or creature.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mobile {
    pub index: u8,
    pub state: u8,
    pub pos: Point,
    pub colors: u8,
    /// Kept one extra frame after it stopped being transmitted.
    pub persist: bool,
    pub name_tag: Option<NameTagKey>,
}

impl Mobile {
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.state == POSE_DEAD
    }
}

/// A timed speech/thought overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bubble {
    pub owner: u8,
    pub text: String,
    pub kind: BubbleKind,
    pub raw_type: u8,
    pub created_frame: u64,
    pub lifetime: u64,
    pub position: Option<Point>,
}

impl Bubble {
    /// Returns `true` once `frame` is `lifetime` or more frames past creation.
    #[must_use]
    pub const fn is_expired(&self, frame: u64) -> bool {
        frame.saturating_sub(self.created_frame) >= self.lifetime
    }
}

/// Stat bars for the local player.
pub type Stats = StatBlock;

/// One inventory item.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Item {
    pub id: u16,
    pub name: String,
    pub equipped: bool,
}

/// Ack bookkeeping for the retransmission layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AckState {
    pub ack_cmd: u8,
    pub ack: u32,
    pub resend: u32,
}
