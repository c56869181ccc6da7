//! Bubble visibility and chat line construction.

use wire::BubbleKind;

use crate::catalog::PlayerRegistry;
use crate::settings::Settings;
use crate::types::{Descriptor, DescriptorKind};

/// Who a bubble came from, relative to the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Myself,
    OtherPlayer,
    /// No player descriptor: monsters, NPCs and the world itself.
    Unnamed,
}

impl Origin {
    #[must_use]
    pub fn of(speaker: Option<&Descriptor>, settings: &Settings) -> Self {
        match speaker {
            Some(desc) if !settings.player_name.is_empty() && desc.name == settings.player_name => {
                Self::Myself
            }
            Some(desc) if desc.kind == DescriptorKind::Player => Self::OtherPlayer,
            _ => Self::Unnamed,
        }
    }
}

/// Where a bubble's text may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    /// Draw the bubble over the scene.
    pub bubble: bool,
    /// Print the text to the chat/console sink.
    pub chat: bool,
}

impl Visibility {
    pub const HIDDEN: Self = Self {
        bubble: false,
        chat: false,
    };
}

/// Decides where a bubble of `kind` from `speaker` is shown.
///
/// Ignored players are hidden everywhere. Blocked players and the per-type and
/// per-origin toggles only hide the bubble; the chat line still prints.
#[must_use]
pub fn visibility(
    kind: BubbleKind,
    speaker: Option<&Descriptor>,
    settings: &Settings,
    players: &dyn PlayerRegistry,
) -> Visibility {
    let status = speaker
        .filter(|desc| !desc.name.is_empty())
        .and_then(|desc| players.status(&desc.name))
        .unwrap_or_default();
    if status.ignored {
        return Visibility::HIDDEN;
    }

    let origin_shown = match Origin::of(speaker, settings) {
        Origin::Myself => settings.show_self,
        Origin::OtherPlayer => settings.show_others,
        Origin::Unnamed => settings.show_unnamed,
    };

    Visibility {
        bubble: !status.blocked && settings.shows_kind(kind) && origin_shown,
        chat: true,
    }
}

/// Builds the chat line for a bubble.
#[must_use]
pub fn format_chat(speaker: Option<&str>, kind: BubbleKind, text: &str) -> String {
    let name = speaker.filter(|name| !name.is_empty()).unwrap_or("Someone");
    match kind {
        BubbleKind::Normal => format!("{name} says, \"{text}\""),
        BubbleKind::Whisper => format!("{name} whispers, \"{text}\""),
        BubbleKind::Yell => format!("{name} yells, \"{text}\""),
        BubbleKind::Thought => format!("{name} thinks, \"{text}\""),
        BubbleKind::Ponder => format!("{name} ponders, \"{text}\""),
        BubbleKind::RealAction | BubbleKind::PlayerAction | BubbleKind::Monster => {
            format!("{name} {text}")
        }
        BubbleKind::Narrate => text.to_string(),
        BubbleKind::Unknown(_) => format!("{name}: {text}"),
    }
}

/// Returns `true` if a bubble of `kind` is read aloud when speech is on.
#[must_use]
pub const fn is_spoken(kind: BubbleKind) -> bool {
    matches!(
        kind,
        BubbleKind::Normal | BubbleKind::Whisper | BubbleKind::Yell
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PlayerList;

    fn player(name: &str) -> Descriptor {
        Descriptor {
            index: 1,
            kind: DescriptorKind::Player,
            sprite: 100,
            name: name.to_string(),
            colors: Vec::new(),
            plane: 0,
        }
    }

    #[test]
    fn formats_by_kind() {
        assert_eq!(
            format_chat(Some("Bob"), BubbleKind::Normal, "hi"),
            "Bob says, \"hi\""
        );
        assert_eq!(
            format_chat(Some("Bob"), BubbleKind::Yell, "HEY"),
            "Bob yells, \"HEY\""
        );
        assert_eq!(
            format_chat(Some("Bob"), BubbleKind::PlayerAction, "waves."),
            "Bob waves."
        );
        assert_eq!(
            format_chat(None, BubbleKind::Whisper, "psst"),
            "Someone whispers, \"psst\""
        );
        assert_eq!(
            format_chat(Some("Bob"), BubbleKind::Narrate, "The wind howls."),
            "The wind howls."
        );
    }

    #[test]
    fn ignored_hides_everything() {
        let mut players = PlayerList::new();
        players.ignore("Bob");
        let bob = player("Bob");
        let vis = visibility(BubbleKind::Normal, Some(&bob), &Settings::default(), &players);
        assert_eq!(vis, Visibility::HIDDEN);
    }

    #[test]
    fn blocked_hides_bubble_only() {
        let mut players = PlayerList::new();
        players.block("Bob");
        let bob = player("Bob");
        let vis = visibility(BubbleKind::Normal, Some(&bob), &Settings::default(), &players);
        assert!(!vis.bubble);
        assert!(vis.chat);
    }

    #[test]
    fn origin_toggles() {
        let settings = Settings {
            player_name: "Me".to_string(),
            show_self: false,
            ..Settings::default()
        };
        let players = PlayerList::new();
        let me = player("Me");
        let bob = player("Bob");
        assert!(!visibility(BubbleKind::Normal, Some(&me), &settings, &players).bubble);
        assert!(visibility(BubbleKind::Normal, Some(&bob), &settings, &players).bubble);
        assert_eq!(Origin::of(None, &settings), Origin::Unnamed);
    }

    #[test]
    fn kind_toggle_hides_bubble() {
        let settings = Settings {
            show_yell: false,
            ..Settings::default()
        };
        let bob = player("Bob");
        let vis = visibility(BubbleKind::Yell, Some(&bob), &settings, &PlayerList::new());
        assert!(!vis.bubble);
        assert!(vis.chat);
    }
}
