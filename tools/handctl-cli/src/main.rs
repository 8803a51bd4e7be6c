//! handctl CLI: drive the gesture pipeline from recorded landmark streams.
//!
//! Usage:
//!   handctl replay <FRAMES>        Run a recording through the pipeline
//!   handctl synth <GESTURE> -o F   Write a synthetic recording
//!   handctl check                  Validate config, mapping and templates
//!   handctl gestures               List the gesture registry
//!   handctl init                   Write default configuration files

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "handctl",
    about = "Hand-gesture recognition and input dispatch",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recorded landmark stream through the pipeline
    Replay {
        /// JSONL recording (optional `#` header line, then one frame per line)
        frames: PathBuf,

        /// Config file (defaults to the standard location)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Gesture mapping overrides
        #[arg(long)]
        mapping: Option<PathBuf>,

        /// Custom gesture templates
        #[arg(long)]
        templates: Option<PathBuf>,

        /// Print every event as a JSON line
        #[arg(long)]
        json_events: bool,

        /// Release frames at their recorded pace
        #[arg(long)]
        realtime: bool,

        /// Execute actuator commands on a separate thread
        #[arg(long)]
        queued: bool,
    },

    /// Write a synthetic recording of one gesture
    Synth {
        /// Gesture name, e.g. CLOSED_FIST, PINCH or SWIPE_LEFT
        gesture: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Number of frames
        #[arg(long, default_value = "30")]
        frames: usize,

        /// Frames per second
        #[arg(long, default_value = "30")]
        fps: u32,

        /// Hand: left or right
        #[arg(long, default_value = "right")]
        hand: String,
    },

    /// Validate configuration, mapping and template documents
    Check {
        /// Config file (defaults to the standard location)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Gesture mapping overrides
        #[arg(long)]
        mapping: Option<PathBuf>,

        /// Custom gesture templates
        #[arg(long)]
        templates: Option<PathBuf>,
    },

    /// List built-in gestures, their default actions and precedence
    Gestures,

    /// Write a default config and empty mapping/template documents
    Init {
        /// Output directory (defaults to the standard config directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    handctl_common::logging::init_logging(&handctl_common::config::LoggingConfig {
        level: log_level.to_string(),
        json: cli.json_logs,
    });

    match cli.command {
        Commands::Replay {
            frames,
            config,
            mapping,
            templates,
            json_events,
            realtime,
            queued,
        } => {
            commands::replay::run(commands::replay::ReplayArgs {
                frames,
                config,
                mapping,
                templates,
                json_events,
                realtime,
                queued,
            })
            .await
        }
        Commands::Synth {
            gesture,
            output,
            frames,
            fps,
            hand,
        } => commands::synth::run(gesture, output, frames, fps, hand),
        Commands::Check {
            config,
            mapping,
            templates,
        } => commands::check::run(config, mapping, templates),
        Commands::Gestures => commands::gestures::run(),
        Commands::Init { output, force } => commands::init::run(output, force),
    }
}
