//! Lookups the scene queries but does not own.
//!
//! Sprite metadata and the player registry live outside the client core.
//! Both traits are `Send + Sync` so a single catalog can be shared between the
//! network task, the movie ticker and a seek in progress.

use std::collections::HashMap;

/// Metadata for one sprite id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpriteInfo {
    /// Count of non-transparent pixels.
    pub pixel_count: u32,
    pub width: u16,
    pub height: u16,
    pub plane: i16,
    pub frame: u16,
}

/// Sprite metadata lookup by id.
pub trait SpriteCatalog: Send + Sync {
    /// Returns metadata for `sprite`, or `None` if the id is unknown.
    fn sprite(&self, sprite: u16) -> Option<SpriteInfo>;

    /// Non-transparent pixel count; unknown sprites weigh nothing.
    fn pixel_count(&self, sprite: u16) -> u32 {
        self.sprite(sprite).map_or(0, |info| info.pixel_count)
    }

    /// Draw plane; unknown sprites draw on plane 0.
    fn plane(&self, sprite: u16) -> i16 {
        self.sprite(sprite).map_or(0, |info| info.plane)
    }
}

/// Registry state for one player name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerStatus {
    /// Bubbles from this player are hidden.
    pub blocked: bool,
    /// Bubbles and chat lines from this player are hidden.
    pub ignored: bool,
    pub clan: Option<String>,
}

/// Player block/ignore/clan lookup by name.
pub trait PlayerRegistry: Send + Sync {
    fn status(&self, name: &str) -> Option<PlayerStatus>;
}

/// In-memory sprite catalog.
#[derive(Debug, Clone, Default)]
pub struct SpriteTable {
    sprites: HashMap<u16, SpriteInfo>,
}

impl SpriteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the metadata for `sprite`.
    pub fn insert(&mut self, sprite: u16, info: SpriteInfo) {
        self.sprites.insert(sprite, info);
    }

    /// Builder form of [`SpriteTable::insert`].
    #[must_use]
    pub fn with(mut self, sprite: u16, info: SpriteInfo) -> Self {
        self.insert(sprite, info);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}

impl SpriteCatalog for SpriteTable {
    fn sprite(&self, sprite: u16) -> Option<SpriteInfo> {
        self.sprites.get(&sprite).copied()
    }
}

/// In-memory player registry.
#[derive(Debug, Clone, Default)]
pub struct PlayerList {
    players: HashMap<String, PlayerStatus>,
}

impl PlayerList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, status: PlayerStatus) {
        self.players.insert(name.into(), status);
    }

    /// Marks `name` as blocked.
    pub fn block(&mut self, name: impl Into<String>) {
        self.players.entry(name.into()).or_default().blocked = true;
    }

    /// Marks `name` as ignored.
    pub fn ignore(&mut self, name: impl Into<String>) {
        self.players.entry(name.into()).or_default().ignored = true;
    }
}

impl PlayerRegistry for PlayerList {
    fn status(&self, name: &str) -> Option<PlayerStatus> {
        self.players.get(name).cloned()
    }
}
