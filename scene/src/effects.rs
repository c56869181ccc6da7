//! Side effects of applying a frame.
//!
//! Everything a frame does besides mutating [`DrawState`](crate::DrawState)
//! goes through a [`FrameSink`]. Replays during a seek pass
//! [`EffectMode::Silent`], which drops these calls while the state itself is
//! still rebuilt exactly.

use wire::InventoryCommand;

/// A player descriptor whose sprite, colors or name changed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AppearanceEvent {
    pub index: u8,
    pub name: String,
    pub sprite: u16,
    pub colors: Vec<u8>,
}

/// Consumer of per-frame effects. Every method defaults to doing nothing.
pub trait FrameSink {
    /// A formatted chat/console line.
    fn chat(&mut self, _line: &str) {}

    /// Text for a speech synthesizer.
    fn speech(&mut self, _speaker: &str, _text: &str) {}

    /// Sound ids to play this frame.
    fn sounds(&mut self, _ids: &[u16]) {}

    fn appearance(&mut self, _event: &AppearanceEvent) {}

    fn inventory(&mut self, _commands: &[InventoryCommand]) {}

    /// The info line changed.
    fn info(&mut self, _text: &str) {}
}

/// Whether effects reach the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectMode {
    #[default]
    Live,
    /// Rebuild state only; used while replaying toward a seek target.
    Silent,
}

/// A sink paired with the mode it is used in.
pub struct Effects<'a> {
    sink: &'a mut dyn FrameSink,
    mode: EffectMode,
}

impl<'a> Effects<'a> {
    pub fn new(sink: &'a mut dyn FrameSink, mode: EffectMode) -> Self {
        Self { sink, mode }
    }

    pub fn live(sink: &'a mut dyn FrameSink) -> Self {
        Self::new(sink, EffectMode::Live)
    }

    #[must_use]
    pub const fn mode(&self) -> EffectMode {
        self.mode
    }

    #[must_use]
    pub const fn is_silent(&self) -> bool {
        matches!(self.mode, EffectMode::Silent)
    }

    fn sink(&mut self) -> Option<&mut dyn FrameSink> {
        match self.mode {
            EffectMode::Live => Some(&mut *self.sink),
            EffectMode::Silent => None,
        }
    }

    pub(crate) fn chat(&mut self, line: &str) {
        if let Some(sink) = self.sink() {
            sink.chat(line);
        }
    }

    pub(crate) fn speech(&mut self, speaker: &str, text: &str) {
        if let Some(sink) = self.sink() {
            sink.speech(speaker, text);
        }
    }

    pub(crate) fn sounds(&mut self, ids: &[u16]) {
        if ids.is_empty() {
            return;
        }
        if let Some(sink) = self.sink() {
            sink.sounds(ids);
        }
    }

    pub(crate) fn appearance(&mut self, event: &AppearanceEvent) {
        if let Some(sink) = self.sink() {
            sink.appearance(event);
        }
    }

    pub(crate) fn inventory(&mut self, commands: &[InventoryCommand]) {
        if commands.is_empty() {
            return;
        }
        if let Some(sink) = self.sink() {
            sink.inventory(commands);
        }
    }

    pub(crate) fn info(&mut self, text: &str) {
        if let Some(sink) = self.sink() {
            sink.info(text);
        }
    }
}

impl std::fmt::Debug for Effects<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effects").field("mode", &self.mode).finish()
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl FrameSink for NullSink {}

/// One recorded effect.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Effect {
    Chat(String),
    Speech { speaker: String, text: String },
    Sounds(Vec<u16>),
    Appearance(AppearanceEvent),
    Inventory(Vec<InventoryCommand>),
    Info(String),
}

/// Collects effects in order, for tests and tools.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub effects: Vec<Effect>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Chat lines recorded so far.
    pub fn chat_lines(&self) -> impl Iterator<Item = &str> {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::Chat(line) => Some(line.as_str()),
            _ => None,
        })
    }

    /// Drains recorded effects.
    pub fn take(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }
}

impl FrameSink for RecordingSink {
    fn chat(&mut self, line: &str) {
        self.effects.push(Effect::Chat(line.to_string()));
    }

    fn speech(&mut self, speaker: &str, text: &str) {
        self.effects.push(Effect::Speech {
            speaker: speaker.to_string(),
            text: text.to_string(),
        });
    }

    fn sounds(&mut self, ids: &[u16]) {
        self.effects.push(Effect::Sounds(ids.to_vec()));
    }

    fn appearance(&mut self, event: &AppearanceEvent) {
        self.effects.push(Effect::Appearance(event.clone()));
    }

    fn inventory(&mut self, commands: &[InventoryCommand]) {
        self.effects.push(Effect::Inventory(commands.to_vec()));
    }

    fn info(&mut self, text: &str) {
        self.effects.push(Effect::Info(text.to_string()));
    }
}
