//! Teyuto CLI - Headless Player Analytics Tool
//!
//! Features:
//! - Simulated playback sessions through any adapter
//! - Dry runs that print the reports instead of sending them
//! - One-off enter / update calls against the analytics API

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use teyuto_core::{PlayerKind, ReportEncoding};

mod commands;
mod output;

/// Teyuto CLI - Player analytics toolkit
#[derive(Parser)]
#[command(name = "teyuto")]
#[command(author = "Teyuto")]
#[command(version)]
#[command(about = "Simulate player sessions and exercise the analytics API", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", global = true)]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

/// Connection settings shared by every command
#[derive(Args, Clone)]
pub struct ConnectionArgs {
    /// JSON config file; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Channel identifier
    #[arg(short, long)]
    pub channel: Option<String>,

    /// Bearer token
    #[arg(short, long)]
    pub token: Option<String>,

    /// Analytics API base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Body encoding
    #[arg(long, value_enum)]
    pub encoding: Option<EncodingArg>,

    /// Request timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum EncodingArg {
    Json,
    Multipart,
}

impl From<EncodingArg> for ReportEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Json => ReportEncoding::Json,
            EncodingArg::Multipart => ReportEncoding::Multipart,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PlayerArg {
    Videojs,
    Hls,
    Plyr,
    Shaka,
}

impl From<PlayerArg> for PlayerKind {
    fn from(arg: PlayerArg) -> Self {
        match arg {
            PlayerArg::Videojs => PlayerKind::VideoJs,
            PlayerArg::Hls => PlayerKind::Hls,
            PlayerArg::Plyr => PlayerKind::Plyr,
            PlayerArg::Shaka => PlayerKind::Shaka,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play a simulated video and report it
    Simulate {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Player library to simulate
        #[arg(short, long, value_enum, default_value = "videojs")]
        player: PlayerArg,

        /// Video identifier
        #[arg(long)]
        video: String,

        /// Content duration in seconds
        #[arg(short, long, default_value = "120")]
        duration: f64,

        /// Seconds of wall-clock time to play
        #[arg(short, long, default_value = "45")]
        watch: f64,

        /// Pause after this many seconds of playback
        #[arg(long)]
        pause_at: Option<f64>,

        /// Record reports instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Send a single action_enter report
    Enter {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Video identifier
        #[arg(long)]
        video: String,

        /// Playback position in seconds
        #[arg(long, default_value = "0")]
        time: f64,

        /// Mark as the first enter of a session
        #[arg(long)]
        first: bool,
    },

    /// Send a single action_update report
    Update {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Video identifier
        #[arg(long)]
        video: String,

        /// Playback position in seconds
        #[arg(long)]
        time: f64,

        /// Action token from a previous enter
        #[arg(long)]
        action: Option<String>,

        /// Mark playback as ended
        #[arg(long)]
        end: bool,

        /// Seconds played since the last flush
        #[arg(long, default_value = "0")]
        sp: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt().with_env_filter(level);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Simulate { connection, player, video, duration, watch, pause_at, dry_run } => {
            let config = commands::load_config(&connection)?;
            let options = commands::SimulateOptions {
                player: player.into(),
                video,
                duration,
                watch,
                pause_at,
                dry_run,
            };
            commands::simulate(config, options, &cli.format).await?;
        }
        Commands::Enter { connection, video, time, first } => {
            let config = commands::load_config(&connection)?;
            commands::enter(config, video, time, first, &cli.format).await?;
        }
        Commands::Update { connection, video, time, action, end, sp } => {
            let config = commands::load_config(&connection)?;
            commands::update(config, video, time, action, end, sp, &cli.format).await?;
        }
    }

    Ok(())
}
