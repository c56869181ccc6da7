use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scene::{SceneConfig, SpriteTable, TimelineConfig};
use tools::{
    format_decode_pretty, inspect_frame, load_recording, load_settings, load_sprites, replay,
    seek_to, InspectReport,
};

#[derive(Parser)]
#[command(
    name = "tableau-tools",
    version,
    about = "tableau draw-state inspection and replay tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the decoding stages of a message and their sizes.
    Inspect {
        /// A message file, or a recording directory.
        frame_path: PathBuf,
        /// Optional glob filter when inspecting a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Limit the number of inspected messages.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Decode one message.
    Decode {
        frame_file: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Play a recording through the scene engine.
    Replay {
        dir: PathBuf,
        #[command(flatten)]
        scene: SceneArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
    /// Seek a recording to a frame through the checkpointed timeline.
    Seek {
        dir: PathBuf,
        /// Frames to have applied after the seek.
        #[arg(long)]
        frame: u64,
        #[command(flatten)]
        scene: SceneArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
}

#[derive(clap::Args)]
struct SceneArgs {
    /// Optional glob filter for recording files.
    #[arg(long)]
    glob: Option<String>,
    /// Settings JSON; missing fields take defaults.
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Sprite metadata JSON keyed by sprite id.
    #[arg(long)]
    sprites: Option<PathBuf>,
    /// Frames between checkpoints.
    #[arg(long, default_value_t = TimelineConfig::default().interval)]
    interval: u64,
}

impl SceneArgs {
    fn load(&self) -> Result<(SceneConfig, TimelineConfig, SpriteTable)> {
        let mut config = SceneConfig::default();
        if let Some(path) = &self.settings {
            config.settings = load_settings(path)?;
        }
        let sprites = self
            .sprites
            .as_deref()
            .map(load_sprites)
            .transpose()?
            .unwrap_or_default();
        anyhow::ensure!(self.interval > 0, "checkpoint interval must be positive");
        let timeline = TimelineConfig {
            interval: self.interval,
        };
        Ok((config, timeline, sprites))
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match cli.command {
        Command::Inspect {
            frame_path,
            glob,
            limit,
        } => {
            if frame_path.is_dir() {
                let mut frames = load_recording(&frame_path, glob.as_deref())?;
                if let Some(limit) = limit {
                    frames.truncate(limit);
                }
                for frame in frames {
                    println!("== {} ({} bytes) ==", frame.path.display(), frame.bytes.len());
                    print_inspect_report(&inspect_frame(&frame.bytes, &wire::Limits::default()));
                }
            } else {
                let bytes = read_frame(&frame_path)?;
                print_inspect_report(&inspect_frame(&bytes, &wire::Limits::default()));
            }
        }
        Command::Decode { frame_file, format } => {
            let bytes = read_frame(&frame_file)?;
            let message = wire::decode_draw_message(&bytes, &wire::Limits::default())
                .map_err(|err| anyhow::anyhow!("decode failed: {err}"))?;
            match format {
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&message).context("serialize json")?;
                    println!("{json}");
                }
                OutputFormat::Pretty => print!("{}", format_decode_pretty(&message)),
            }
        }
        Command::Replay {
            dir,
            scene: args,
            format,
        } => {
            let (config, timeline, sprites) = args.load()?;
            let frames = load_recording(&dir, args.glob.as_deref())?;
            let report = replay(&frames, config, timeline, &sprites);
            match format {
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&report).context("serialize json")?;
                    println!("{json}");
                }
                OutputFormat::Pretty => {
                    println!(
                        "frames: {} failed: {} checkpoints: {:?}",
                        report.frames,
                        report.failures.len(),
                        report.checkpoints
                    );
                    for summary in &report.summaries {
                        println!(
                            "  frame {}: shift ({}, {}){} pictures {} (again {}, carried {}) mobiles {} (persisted {})",
                            summary.frame,
                            summary.shift.dx,
                            summary.shift.dy,
                            if summary.motion_ok { "" } else { " no-motion" },
                            summary.pictures,
                            summary.again,
                            summary.carried,
                            summary.mobiles,
                            summary.persisted
                        );
                    }
                    for failure in &report.failures {
                        println!(
                            "  frame {} ({}): {}",
                            failure.frame,
                            failure.path.display(),
                            failure.error
                        );
                    }
                    for effect in &report.effects {
                        if let scene::Effect::Chat(line) = effect {
                            println!("chat: {line}");
                        }
                    }
                    print_snapshot_summary(&report.snapshot);
                }
            }
        }
        Command::Seek {
            dir,
            frame,
            scene: args,
            format,
        } => {
            let (config, timeline, sprites) = args.load()?;
            let frames = load_recording(&dir, args.glob.as_deref())?;
            let (report, snapshot) = seek_to(&frames, config, timeline, &sprites, frame);
            match format {
                OutputFormat::Json => {
                    let json =
                        serde_json::to_string_pretty(&snapshot).context("serialize json")?;
                    println!("{json}");
                }
                OutputFormat::Pretty => {
                    println!(
                        "target: {} from checkpoint: {} replayed: {} failed: {}",
                        report.target, report.from, report.replayed, report.failures
                    );
                    print_snapshot_summary(&snapshot);
                }
            }
        }
    }
    Ok(())
}

fn read_frame(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("read frame {}", path.display()))
}

fn print_inspect_report(report: &InspectReport) {
    match report.header {
        Some(header) => println!(
            "ack_cmd: {} ack: {} resend: {} length: {} bytes",
            header.ack_cmd, header.ack, header.resend, report.byte_len
        ),
        None => println!("no header ({} bytes)", report.byte_len),
    }
    if let Some(err) = &report.error {
        println!("decode failed: {err}");
        return;
    }
    println!("stages:");
    for span in &report.stages {
        println!(
            "  {}: bits {}..{} ({} bytes)",
            span.stage.name(),
            span.start_bit,
            span.end_bit,
            span.byte_len()
        );
    }
    if let Some(message) = &report.message {
        println!(
            "counts: {} descriptors, {} again + {} pictures, {} mobiles, {} bubbles, {} sounds, {} inventory commands",
            message.descriptors.len(),
            message.pict_again,
            message.pictures.len(),
            message.mobiles.len(),
            message.bubbles.len(),
            message.sounds.len(),
            message.inventory.len()
        );
    }
}

fn print_snapshot_summary(snapshot: &scene::Snapshot) {
    println!(
        "frame {}: {} descriptors, {} pictures, {} mobiles, {} bubbles, {} items",
        snapshot.frame,
        snapshot.descriptors.len(),
        snapshot.pictures.len(),
        snapshot.mobiles.len(),
        snapshot.bubbles.len(),
        snapshot.inventory.len()
    );
    println!(
        "shift: ({}, {}) interpolate: {}",
        snapshot.shift.dx, snapshot.shift.dy, snapshot.interpolate
    );
    if !snapshot.info_text.is_empty() {
        println!("info: {}", snapshot.info_text);
    }
}
