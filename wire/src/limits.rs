//! Configurable ceilings for bounded decoding.

/// Ceilings enforced while decoding a draw-state message.
///
/// Every declared count is checked against its ceiling before any record is
/// read, so a corrupt count is rejected without iterating over garbage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum message size in bytes.
    pub max_message_bytes: usize,
    /// Maximum descriptors in one message.
    pub max_descriptors: usize,
    /// Maximum color bytes per descriptor.
    pub max_colors: usize,
    /// Maximum pictures after "again" reconstruction (again + transmitted).
    pub max_pictures: usize,
    /// Maximum mobiles in one message.
    pub max_mobiles: usize,
    /// Maximum bubbles in one message.
    pub max_bubbles: usize,
    /// Maximum sound ids in one message.
    pub max_sounds: usize,
    /// Maximum items in a full inventory replace.
    pub max_inventory_items: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_message_bytes: 64 * 1024,
            max_descriptors: 255,
            max_colors: 32,
            max_pictures: 512,
            max_mobiles: 255,
            max_bubbles: 64,
            max_sounds: 32,
            max_inventory_items: 255,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_message_bytes: 4096,
            max_descriptors: 16,
            max_colors: 8,
            max_pictures: 64,
            max_mobiles: 16,
            max_bubbles: 4,
            max_sounds: 4,
            max_inventory_items: 16,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_message_bytes: usize::MAX,
            max_descriptors: usize::MAX,
            max_colors: usize::MAX,
            max_pictures: usize::MAX,
            max_mobiles: usize::MAX,
            max_bubbles: usize::MAX,
            max_sounds: usize::MAX,
            max_inventory_items: usize::MAX,
        }
    }
}
