//! Inspection, decoding and replay tools for tableau draw-state recordings.
//!
//! This crate provides utilities for looking inside recorded sessions:
//!
//! - Break a draw-state message into its decoding stages and sizes
//! - Decode a message into JSON or a readable listing
//! - Replay a recording through the scene engine and report the result
//! - Seek a recording through the checkpointed timeline
//!
//! A recording is a directory holding one message body per file; files play
//! in file-name order.
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Same engine** - Replays run the exact scene code the client runs.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::Pattern;
use scene::{
    CheckpointedTimeline, Collaborators, Effect, Effects, FrameSummary, PlayerList, RecordingSink,
    SceneConfig, SeekReport, Settings, Snapshot, SpriteCatalog, SpriteInfo, SpriteTable,
    StateStore, TimelineConfig,
};
use serde::Serialize;
use wire::{
    decode_draw_message_with_layout, peek_header, DecodeError, DrawMessage, FrameHeader, Limits,
    StageSpan,
};

/// One recorded message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFrame {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl AsRef<[u8]> for RecordedFrame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Reads every file in `dir` (optionally filtered by `glob`) in file-name order.
pub fn load_recording(dir: &Path, glob: Option<&str>) -> Result<Vec<RecordedFrame>> {
    let pattern = glob
        .map(|value| Pattern::new(value).context("invalid glob pattern"))
        .transpose()?;

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(pattern) = &pattern {
            let matches_path = pattern.matches_path(&path);
            let matches_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name));
            if !matches_path && !matches_name {
                continue;
            }
        }
        paths.push(path);
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    paths
        .into_iter()
        .map(|path| {
            let bytes = fs::read(&path).with_context(|| format!("read frame {}", path.display()))?;
            Ok(RecordedFrame { path, bytes })
        })
        .collect()
}

/// Loads client settings from JSON. Missing fields take their defaults.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read settings {}", path.display()))?;
    serde_json::from_str(&contents).context("parse settings json")
}

/// Loads a sprite table from a JSON object keyed by sprite id.
pub fn load_sprites(path: &Path) -> Result<SpriteTable> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read sprites {}", path.display()))?;
    let entries: std::collections::BTreeMap<u16, SpriteInfo> =
        serde_json::from_str(&contents).context("parse sprites json")?;
    Ok(entries
        .into_iter()
        .fold(SpriteTable::new(), |table, (id, info)| table.with(id, info)))
}

/// Stage breakdown of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectReport {
    pub byte_len: usize,
    pub header: Option<FrameHeader>,
    /// Empty when decoding failed.
    pub stages: Vec<StageSpan>,
    pub message: Option<DrawMessage>,
    pub error: Option<DecodeError>,
}

/// Decodes `bytes` and records where each stage sits.
#[must_use]
pub fn inspect_frame(bytes: &[u8], limits: &Limits) -> InspectReport {
    match decode_draw_message_with_layout(bytes, limits) {
        Ok((message, layout)) => InspectReport {
            byte_len: bytes.len(),
            header: Some(message.header),
            stages: layout.spans,
            message: Some(message),
            error: None,
        },
        Err(err) => InspectReport {
            byte_len: bytes.len(),
            header: peek_header(bytes),
            stages: Vec::new(),
            message: None,
            error: Some(err),
        },
    }
}

/// Renders a decoded message as an indented listing.
#[must_use]
pub fn format_decode_pretty(message: &DrawMessage) -> String {
    let mut out = String::new();
    let header = message.header;
    let _ = writeln!(
        out,
        "ack_cmd: {} ack: {} resend: {}",
        header.ack_cmd, header.ack, header.resend
    );
    let stats = message.stats;
    let _ = writeln!(
        out,
        "stats: hp {}/{} sp {}/{} balance {}/{} light {}",
        stats.hp,
        stats.hp_max,
        stats.sp,
        stats.sp_max,
        stats.balance,
        stats.balance_max,
        stats.lighting
    );
    if !message.descriptors.is_empty() {
        let _ = writeln!(out, "descriptors:");
        for desc in &message.descriptors {
            let _ = writeln!(
                out,
                "  #{} kind {} sprite {} {:?} colors {:?}",
                desc.index, desc.kind, desc.sprite, desc.name, desc.colors
            );
        }
    }
    let _ = writeln!(
        out,
        "pictures: {} again + {} sent",
        message.pict_again,
        message.pictures.len()
    );
    for pict in &message.pictures {
        let _ = writeln!(out, "  sprite {} at ({}, {})", pict.sprite, pict.h, pict.v);
    }
    if !message.mobiles.is_empty() {
        let _ = writeln!(out, "mobiles:");
        for mobile in &message.mobiles {
            let _ = writeln!(
                out,
                "  #{} state {} at ({}, {})",
                mobile.index, mobile.state, mobile.h, mobile.v
            );
        }
    }
    if !message.info_text.is_empty() {
        let _ = writeln!(out, "info: {:?}", message.info_text);
    }
    if !message.bubbles.is_empty() {
        let _ = writeln!(out, "bubbles:");
        for bubble in &message.bubbles {
            let _ = writeln!(
                out,
                "  #{} {:?} {:?}",
                bubble.index,
                bubble.flags.kind(),
                bubble.text
            );
        }
    }
    if !message.sounds.is_empty() {
        let _ = writeln!(out, "sounds: {:?}", message.sounds);
    }
    if !message.inventory.is_empty() {
        let _ = writeln!(out, "inventory:");
        for command in &message.inventory {
            let _ = writeln!(out, "  {command:?}");
        }
    }
    out
}

/// A frame that failed during replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayFailure {
    /// 1-based frame number.
    pub frame: u64,
    pub path: PathBuf,
    pub error: String,
}

/// Result of playing a whole recording.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub frames: u64,
    /// One entry per successfully applied frame.
    pub summaries: Vec<FrameSummary>,
    pub failures: Vec<ReplayFailure>,
    pub effects: Vec<Effect>,
    pub checkpoints: Vec<u64>,
    pub snapshot: Snapshot,
}

/// Plays `frames` in order with live effects, recording checkpoints as a
/// client would.
#[must_use]
pub fn replay(
    frames: &[RecordedFrame],
    config: SceneConfig,
    timeline: TimelineConfig,
    sprites: &dyn SpriteCatalog,
) -> ReplayReport {
    let store = StateStore::new(config);
    let timeline = CheckpointedTimeline::starting_from(timeline, store.capture());
    let players = PlayerList::new();
    let with = Collaborators::new(sprites, &players);
    let mut sink = RecordingSink::new();
    let mut summaries = Vec::with_capacity(frames.len());
    let mut failures = Vec::new();

    for frame in frames {
        match store.apply(&frame.bytes, with, &mut Effects::live(&mut sink)) {
            Ok(summary) => summaries.push(summary),
            Err(err) => failures.push(ReplayFailure {
                frame: store.frame(),
                path: frame.path.clone(),
                error: err.to_string(),
            }),
        }
        timeline.record(&store);
    }
    log::info!(
        "replayed {} frames, {} failed",
        frames.len(),
        failures.len()
    );

    ReplayReport {
        frames: store.frame(),
        summaries,
        failures,
        effects: sink.take(),
        checkpoints: timeline.checkpoint_frames(),
        snapshot: store.snapshot(),
    }
}

/// Seeks a fresh timeline over `frames` to `target`.
#[must_use]
pub fn seek_to(
    frames: &[RecordedFrame],
    config: SceneConfig,
    timeline: TimelineConfig,
    sprites: &dyn SpriteCatalog,
    target: u64,
) -> (SeekReport, Snapshot) {
    let store = StateStore::new(config);
    let timeline = CheckpointedTimeline::starting_from(timeline, store.capture());
    let players = PlayerList::new();
    let report = timeline.seek(
        &store,
        frames,
        target,
        Collaborators::new(sprites, &players),
    );
    (report, store.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wire::{encode_draw_message, BubbleFlags, BubbleKind, BubbleRecord, DescriptorRecord};

    static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "tableau-tools-{}-{}",
            std::process::id(),
            DIR_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn frame(n: u32) -> Vec<u8> {
        let mut message = DrawMessage {
            info_text: format!("frame {n}"),
            ..DrawMessage::default()
        };
        message.header.ack = n;
        if n == 1 {
            message.descriptors.push(DescriptorRecord {
                index: 1,
                kind: 0,
                sprite: 10,
                name: "Ann".to_string(),
                colors: vec![],
            });
            message.bubbles.push(BubbleRecord {
                index: 1,
                flags: BubbleFlags::from_raw(BubbleKind::Normal.raw()),
                language: None,
                position: None,
                text: "hi".to_string(),
            });
        }
        encode_draw_message(&message).unwrap()
    }

    fn write_recording(dir: &Path, count: u32) {
        // Written out of order; loading sorts by name.
        for n in (1..=count).rev() {
            fs::write(dir.join(format!("{n:04}.bin")), frame(n)).unwrap();
        }
        fs::write(dir.join("notes.txt"), b"not a frame").unwrap();
    }

    #[test]
    fn recording_loads_in_name_order_with_glob() {
        let dir = scratch_dir();
        write_recording(&dir, 5);
        let frames = load_recording(&dir, Some("*.bin")).unwrap();
        let names: Vec<_> = frames
            .iter()
            .map(|frame| frame.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["0001.bin", "0002.bin", "0003.bin", "0004.bin", "0005.bin"]);
        assert_eq!(load_recording(&dir, None).unwrap().len(), 6);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn inspect_reports_stages() {
        let report = inspect_frame(&frame(1), &Limits::default());
        assert!(report.error.is_none());
        assert_eq!(report.header.unwrap().ack, 1);
        assert_eq!(report.stages.first().unwrap().stage, wire::Stage::Header);
        assert_eq!(report.stages.last().unwrap().stage, wire::Stage::Inventory);
    }

    #[test]
    fn inspect_keeps_header_of_failed_message() {
        let mut bytes = frame(1);
        bytes.truncate(12);
        let report = inspect_frame(&bytes, &Limits::default());
        assert!(report.error.is_some());
        assert!(report.stages.is_empty());
        assert_eq!(report.header.unwrap().ack, 1);
    }

    #[test]
    fn pretty_output_lists_records() {
        let (message, _) = decode_draw_message_with_layout(&frame(1), &Limits::default()).unwrap();
        let text = format_decode_pretty(&message);
        assert!(text.contains("ack: 1"));
        assert!(text.contains("\"Ann\""));
        assert!(text.contains("\"hi\""));
    }

    #[test]
    fn replay_and_seek_agree() {
        let dir = scratch_dir();
        write_recording(&dir, 9);
        let frames = load_recording(&dir, Some("*.bin")).unwrap();
        let sprites = SpriteTable::new();

        let report = replay(
            &frames,
            SceneConfig::for_testing(),
            TimelineConfig::for_testing(),
            &sprites,
        );
        assert_eq!(report.frames, 9);
        assert_eq!(report.summaries.len(), 9);
        assert_eq!(report.summaries[0].bubbles_created, 1);
        assert!(report.failures.is_empty());
        assert_eq!(report.checkpoints, vec![0, 4, 8]);
        assert!(report
            .effects
            .iter()
            .any(|effect| matches!(effect, Effect::Chat(line) if line == "Ann says, \"hi\"")));

        let (seek, snapshot) = seek_to(
            &frames,
            SceneConfig::for_testing(),
            TimelineConfig::for_testing(),
            &sprites,
            100,
        );
        assert_eq!(seek.target, 9);
        assert_eq!(snapshot, report.snapshot);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn replay_reports_bad_frames() {
        let frames = vec![
            RecordedFrame {
                path: PathBuf::from("a"),
                bytes: frame(1),
            },
            RecordedFrame {
                path: PathBuf::from("b"),
                bytes: vec![0; 3],
            },
        ];
        let report = replay(
            &frames,
            SceneConfig::for_testing(),
            TimelineConfig::for_testing(),
            &SpriteTable::new(),
        );
        assert_eq!(report.frames, 2);
        assert_eq!(report.summaries.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].frame, 2);
        assert_eq!(report.snapshot.info_text, "frame 1");
    }

    #[test]
    fn settings_and_sprites_load_from_json() {
        let dir = scratch_dir();
        let settings_path = dir.join("settings.json");
        fs::write(&settings_path, r#"{"player_name": "Ann", "speech": true}"#).unwrap();
        let settings = load_settings(&settings_path).unwrap();
        assert_eq!(settings.player_name, "Ann");
        assert!(settings.speech);
        assert_eq!(settings.bubble_base_lifetime, Settings::default().bubble_base_lifetime);

        let sprites_path = dir.join("sprites.json");
        fs::write(
            &sprites_path,
            r#"{"7": {"pixel_count": 900, "width": 30, "height": 30, "plane": 0, "frame": 0}}"#,
        )
        .unwrap();
        let sprites = load_sprites(&sprites_path).unwrap();
        assert_eq!(sprites.pixel_count(7), 900);
        fs::remove_dir_all(&dir).unwrap();
    }
}
