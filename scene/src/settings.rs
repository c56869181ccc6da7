//! Tunable parameters for the scene pipeline.

use wire::{BubbleKind, Limits};

/// Live visibility and timing settings.
///
/// Persistence is the caller's business; the CLI loads this from JSON when
/// the `serde` feature is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Settings {
    /// Name of the local player, used to classify bubble origin.
    pub player_name: String,
    pub show_normal: bool,
    pub show_whisper: bool,
    pub show_yell: bool,
    pub show_thought: bool,
    pub show_action: bool,
    pub show_monster: bool,
    pub show_narrate: bool,
    /// Show bubbles spoken by the local player.
    pub show_self: bool,
    /// Show bubbles spoken by other players.
    pub show_others: bool,
    /// Show bubbles whose owner has no descriptor (monsters, the world).
    pub show_unnamed: bool,
    /// Emit speech lines for text-to-speech.
    pub speech: bool,
    /// Interpolate motion between frames when the estimate succeeds.
    pub smooth_motion: bool,
    /// Bubble lifetime floor in frames.
    pub bubble_base_lifetime: u64,
    /// Characters of text per extra frame of lifetime.
    pub bubble_chars_per_frame: u64,
    /// Bubble lifetime ceiling in frames.
    pub bubble_max_lifetime: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            player_name: String::new(),
            show_normal: true,
            show_whisper: true,
            show_yell: true,
            show_thought: true,
            show_action: true,
            show_monster: true,
            show_narrate: true,
            show_self: true,
            show_others: true,
            show_unnamed: true,
            speech: false,
            smooth_motion: true,
            bubble_base_lifetime: 24,
            bubble_chars_per_frame: 4,
            bubble_max_lifetime: 96,
        }
    }
}

impl Settings {
    /// Settings with speech on and short bubble lifetimes.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            speech: true,
            bubble_base_lifetime: 4,
            bubble_chars_per_frame: 0,
            bubble_max_lifetime: 4,
            ..Self::default()
        }
    }

    /// Returns whether bubbles of `kind` are shown at all.
    #[must_use]
    pub const fn shows_kind(&self, kind: BubbleKind) -> bool {
        match kind {
            BubbleKind::Normal => self.show_normal,
            BubbleKind::Whisper => self.show_whisper,
            BubbleKind::Yell => self.show_yell,
            BubbleKind::Thought | BubbleKind::Ponder => self.show_thought,
            BubbleKind::RealAction | BubbleKind::PlayerAction => self.show_action,
            BubbleKind::Monster => self.show_monster,
            BubbleKind::Narrate => self.show_narrate,
            BubbleKind::Unknown(_) => true,
        }
    }

    /// Lifetime in frames for a bubble carrying `text`.
    #[must_use]
    pub fn bubble_lifetime(&self, text: &str) -> u64 {
        let chars = text.chars().count() as u64;
        let extra = chars
            .checked_div(self.bubble_chars_per_frame)
            .unwrap_or(0);
        self.bubble_base_lifetime
            .saturating_add(extra)
            .min(self.bubble_max_lifetime)
            .max(1)
    }
}

/// Parameters for picture-shift detection.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MotionConfig {
    /// Sprite ids that are unreliable trackers and never vote.
    pub excluded: Vec<u16>,
    /// Per-match weight ceiling in pixels.
    pub weight_cap: u32,
    /// Minimum pixel weight for a matched picture to count as background.
    pub min_background_weight: u32,
    /// Largest accepted shift; larger vectors are treated as scene cuts.
    pub max_shift: i16,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            excluded: Vec::new(),
            weight_cap: 4000,
            min_background_weight: 100,
            max_shift: 64,
        }
    }
}

impl MotionConfig {
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            max_shift: 16,
            ..Self::default()
        }
    }

    /// No exclusions, no weight cap, any shift accepted.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            excluded: Vec::new(),
            weight_cap: u32::MAX,
            min_background_weight: 0,
            max_shift: i16::MAX,
        }
    }

    #[must_use]
    pub fn is_excluded(&self, sprite: u16) -> bool {
        self.excluded.contains(&sprite)
    }
}

/// Visible field geometry in field coordinates (origin at the center).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FieldGeometry {
    pub half_width: i16,
    pub half_height: i16,
    /// Band inside the border that counts as "near the edge".
    pub edge_margin: i16,
}

impl Default for FieldGeometry {
    fn default() -> Self {
        Self {
            half_width: 273,
            half_height: 270,
            edge_margin: 32,
        }
    }
}

impl FieldGeometry {
    /// Returns `true` if `(h, v)` lies within `edge_margin` of the border or outside it.
    #[must_use]
    pub fn near_edge(&self, h: i16, v: i16) -> bool {
        let h = i32::from(h).abs();
        let v = i32::from(v).abs();
        let margin = i32::from(self.edge_margin);
        h >= i32::from(self.half_width) - margin || v >= i32::from(self.half_height) - margin
    }

    /// Returns `true` if more than half of a `width` x `height` box centered
    /// at `(h, v)` falls outside the field. A box with no size is a point.
    #[must_use]
    pub fn mostly_outside(&self, h: i16, v: i16, width: u16, height: u16) -> bool {
        let (h, v) = (i32::from(h), i32::from(v));
        let field_w = i32::from(self.half_width);
        let field_h = i32::from(self.half_height);
        if width == 0 || height == 0 {
            return h.abs() > field_w || v.abs() > field_h;
        }

        let (half_w, half_h) = (i32::from(width) / 2, i32::from(height) / 2);

        let left = (h - half_w).max(-field_w);
        let right = (h + half_w).min(field_w);
        let top = (v - half_h).max(-field_h);
        let bottom = (v + half_h).min(field_h);

        let area = i64::from(width) * i64::from(height);
        let visible = i64::from((right - left).max(0)) * i64::from((bottom - top).max(0));
        visible * 2 < area
    }
}

/// Checkpoint spacing for seekable playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimelineConfig {
    /// Frames between checkpoints.
    pub interval: u64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self { interval: 100 }
    }
}

impl TimelineConfig {
    #[must_use]
    pub const fn for_testing() -> Self {
        Self { interval: 4 }
    }
}

/// Everything the apply pipeline needs besides collaborators.
#[derive(Debug, Clone, Default)]
pub struct SceneConfig {
    pub limits: Limits,
    pub motion: MotionConfig,
    pub field: FieldGeometry,
    pub settings: Settings,
}

impl SceneConfig {
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            limits: Limits::for_testing(),
            motion: MotionConfig::for_testing(),
            field: FieldGeometry::default(),
            settings: Settings::for_testing(),
        }
    }
}
