//! The visible-world model and the frame apply pipeline.

use std::collections::BTreeMap;

use wire::{peek_header, DrawMessage, FrameHeader};

use crate::cache::RenderCache;
use crate::catalog::{PlayerRegistry, SpriteCatalog};
use crate::chat;
use crate::diff::{self, LinearMatcher, PictureMatcher};
use crate::effects::{AppearanceEvent, Effects};
use crate::error::{SceneError, SceneResult};
use crate::inventory::Inventory;
use crate::motion::{estimate_motion, MotionEstimate};
use crate::settings::SceneConfig;
use crate::types::{
    AckState, Bubble, Descriptor, DescriptorKind, Mobile, NameTagKey, Picture, Point, Shift, Stats,
};

/// Lookups used while applying a frame.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub sprites: &'a dyn SpriteCatalog,
    pub players: &'a dyn PlayerRegistry,
    pub matcher: &'a dyn PictureMatcher,
}

impl<'a> Collaborators<'a> {
    /// Collaborators with the default linear picture matcher.
    pub fn new(sprites: &'a dyn SpriteCatalog, players: &'a dyn PlayerRegistry) -> Self {
        Self {
            sprites,
            players,
            matcher: &LinearMatcher,
        }
    }

    #[must_use]
    pub fn with_matcher(mut self, matcher: &'a dyn PictureMatcher) -> Self {
        self.matcher = matcher;
        self
    }
}

impl std::fmt::Debug for Collaborators<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// What one successfully applied frame did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameSummary {
    pub frame: u64,
    pub shift: Shift,
    pub motion_ok: bool,
    pub pictures: usize,
    pub again: usize,
    pub carried: usize,
    pub mobiles: usize,
    pub persisted: usize,
    pub bubbles_created: usize,
    pub sounds: usize,
}

/// Everything currently visible, plus the previous frame for interpolation.
///
/// Cloning is a deep copy; checkpoints and snapshots rely on that.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DrawState {
    /// Frames processed so far, including failed ones.
    pub frame: u64,
    pub ack: AckState,
    pub descriptors: BTreeMap<u8, Descriptor>,
    pub prev_descriptors: BTreeMap<u8, Descriptor>,
    pub mobiles: BTreeMap<u8, Mobile>,
    pub prev_mobiles: BTreeMap<u8, Mobile>,
    /// Transmitted pictures first, edge carry-overs after them.
    pub pictures: Vec<Picture>,
    pub prev_pictures: Vec<Picture>,
    pub stats: Stats,
    pub prev_stats: Stats,
    pub bubbles: Vec<Bubble>,
    /// Last non-empty info line.
    pub info_text: String,
    pub inventory: Inventory,
    pub motion: MotionEstimate,
    pub cache: RenderCache,
}

impl DrawState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `bytes` and applies the message as the next frame.
    ///
    /// The frame counter advances whether or not the message is usable. On
    /// failure only the ack bookkeeping changes: the header's ack is taken if
    /// it decoded, and the next expected frame becomes `ack + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError`] if the message fails to decode or repeats more
    /// pictures than the previous frame had.
    pub fn apply(
        &mut self,
        bytes: &[u8],
        config: &SceneConfig,
        with: Collaborators<'_>,
        effects: &mut Effects<'_>,
    ) -> SceneResult<FrameSummary> {
        self.frame += 1;

        let message = match wire::decode_draw_message(bytes, &config.limits) {
            Ok(message) => message,
            Err(err) => {
                log::warn!(
                    "frame {}: dropping draw state at {} stage: {}",
                    self.frame,
                    err.stage,
                    err.kind
                );
                self.defensive_ack(peek_header(bytes));
                return Err(SceneError::Decode(err));
            }
        };

        let pictures = match diff::rebuild_pictures(
            &self.pictures,
            message.pict_again,
            &message.pictures,
            with.sprites,
        ) {
            Ok(pictures) => pictures,
            Err(err) => {
                log::warn!("frame {}: {err}", self.frame);
                self.defensive_ack(Some(message.header));
                return Err(err);
            }
        };

        Ok(self.commit(message, pictures, config, with, effects))
    }

    fn defensive_ack(&mut self, header: Option<FrameHeader>) {
        match header {
            Some(header) => {
                self.ack.ack_cmd = header.ack_cmd;
                self.ack.ack = header.ack;
                self.ack.resend = header.ack.wrapping_add(1);
            }
            None => self.ack.resend = self.ack.ack.wrapping_add(1),
        }
    }

    fn commit(
        &mut self,
        message: DrawMessage,
        mut pictures: Vec<Picture>,
        config: &SceneConfig,
        with: Collaborators<'_>,
        effects: &mut Effects<'_>,
    ) -> FrameSummary {
        let DrawMessage {
            header,
            descriptors,
            stats,
            pict_again,
            pictures: _,
            mobiles,
            info_text,
            bubbles,
            sounds,
            inventory,
        } = message;

        self.ack = AckState {
            ack_cmd: header.ack_cmd,
            ack: header.ack,
            resend: header.resend,
        };

        self.prev_descriptors.clone_from(&self.descriptors);
        for record in descriptors {
            let descriptor = Descriptor {
                index: record.index,
                kind: DescriptorKind::from_raw(record.kind),
                sprite: record.sprite,
                plane: with.sprites.plane(record.sprite),
                name: record.name,
                colors: record.colors,
            };
            let changed = self
                .descriptors
                .get(&descriptor.index)
                .map_or(true, |old| old.appearance_differs(&descriptor));
            if changed && descriptor.kind != DescriptorKind::Npc {
                effects.appearance(&AppearanceEvent {
                    index: descriptor.index,
                    name: descriptor.name.clone(),
                    sprite: descriptor.sprite,
                    colors: descriptor.colors.clone(),
                });
            }
            self.descriptors.insert(descriptor.index, descriptor);
        }

        self.prev_stats = self.stats;
        self.stats = stats;

        let transmitted = diff::transmitted_len(&self.pictures);
        let motion = estimate_motion(
            &self.pictures[..transmitted],
            &pictures,
            with.sprites,
            &config.motion,
        );
        diff::reconcile_pictures(
            &self.pictures,
            &mut pictures,
            &motion,
            with.sprites,
            with.matcher,
            &config.field,
        );
        self.prev_pictures = std::mem::replace(&mut self.pictures, pictures);

        let mut live = diff::reconcile_mobiles(&self.mobiles, &mobiles, &motion, &config.field);
        for mobile in live.values_mut() {
            mobile.name_tag = self
                .descriptors
                .get(&mobile.index)
                .filter(|desc| !desc.name.is_empty())
                .map(|desc| NameTagKey {
                    name: desc.name.clone(),
                    colors: mobile.colors,
                    dead: mobile.is_dead(),
                });
        }
        self.prev_mobiles = std::mem::replace(&mut self.mobiles, live);

        let bubbles_created = self.apply_bubbles(bubbles, config, with, effects);

        if !info_text.is_empty() {
            effects.info(&info_text);
            self.info_text = info_text;
        }

        effects.sounds(&sounds);

        for command in &inventory {
            self.inventory.apply(command);
        }
        effects.inventory(&inventory);

        self.cache = RenderCache::build(&self.pictures, &self.mobiles);

        let summary = FrameSummary {
            frame: self.frame,
            shift: motion.shift(),
            motion_ok: motion.ok,
            pictures: self.pictures.len(),
            again: usize::from(pict_again),
            carried: self.pictures.iter().filter(|p| p.carried).count(),
            mobiles: self.mobiles.len(),
            persisted: self.mobiles.values().filter(|m| m.persist).count(),
            bubbles_created,
            sounds: sounds.len(),
        };
        self.motion = motion;
        log::debug!(
            "frame {}: {} pictures ({} again), {} mobiles, shift {:?} ok={}",
            summary.frame,
            summary.pictures,
            summary.again,
            summary.mobiles,
            summary.shift,
            summary.motion_ok
        );
        summary
    }

    fn apply_bubbles(
        &mut self,
        records: Vec<wire::BubbleRecord>,
        config: &SceneConfig,
        with: Collaborators<'_>,
        effects: &mut Effects<'_>,
    ) -> usize {
        let frame = self.frame;
        self.bubbles.retain(|bubble| !bubble.is_expired(frame));

        let settings = &config.settings;
        let mut created = 0;
        for record in records {
            let kind = record.flags.kind();
            let speaker = self.descriptors.get(&record.index);
            let visibility = chat::visibility(kind, speaker, settings, with.players);
            let name = speaker.map(|desc| desc.name.as_str());

            if visibility.chat {
                effects.chat(&chat::format_chat(name, kind, &record.text));
                if settings.speech && chat::is_spoken(kind) {
                    effects.speech(name.unwrap_or_default(), &record.text);
                }
            }
            if visibility.bubble {
                self.bubbles.push(Bubble {
                    owner: record.index,
                    lifetime: settings.bubble_lifetime(&record.text),
                    kind,
                    raw_type: record.flags.raw(),
                    created_frame: frame,
                    position: record.position.map(|(h, v)| Point::new(h, v)),
                    text: record.text,
                });
                created += 1;
            }
        }
        created
    }
}
