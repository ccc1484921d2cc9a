//! CLI command implementations

use crate::output::{format_output, report_line, snapshot_lines, OutputFormat};
use crate::ConnectionArgs;
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use teyuto_core::adapter::DISCOVERY_INTERVAL;
use teyuto_core::player::simulated::{SimulatedHls, SimulatedMedia, SimulatedShaka};
use teyuto_core::session::SessionSnapshot;
use teyuto_core::transport::MemoryTransport;
use teyuto_core::{
    ActionToken, EnterReport, HlsAdapter, HttpTransport, PlaybackReporter, PlayerAdapter,
    PlayerKind, PlyrAdapter, Report, ReportTransport, ReporterConfig, ShakaAdapter,
    UpdateReport, VideoId, VideoJsAdapter,
};
use tracing::{info, warn};

/// Simulated playhead step
const STEP: Duration = Duration::from_millis(250);

/// Time given to in-flight reports after teardown
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Build the reporter configuration from a config file and flags
pub fn load_config(args: &ConnectionArgs) -> anyhow::Result<ReporterConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str::<ReporterConfig>(&json)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => ReporterConfig::default(),
    };

    if let Some(channel) = &args.channel {
        config.channel = channel.clone();
    }
    if let Some(token) = &args.token {
        config.token = Some(token.clone());
    }
    if let Some(api_url) = &args.api_url {
        config.api_url = api_url.clone();
    }
    if let Some(encoding) = args.encoding {
        config.encoding = encoding.into();
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.request_timeout_ms = Some(timeout_ms);
    }

    config.validate()?;
    Ok(config)
}

pub struct SimulateOptions {
    pub player: PlayerKind,
    pub video: String,
    pub duration: f64,
    pub watch: f64,
    pub pause_at: Option<f64>,
    pub dry_run: bool,
}

#[derive(Serialize)]
struct SimulationSummary {
    player: PlayerKind,
    dry_run: bool,
    watched: f64,
    session: Option<SessionSnapshot>,
    reports: Vec<Report>,
}

fn build_adapter(kind: PlayerKind, media: &Arc<SimulatedMedia>) -> Box<dyn PlayerAdapter> {
    match kind {
        PlayerKind::VideoJs => Box::new(VideoJsAdapter::new(media.clone())),
        PlayerKind::Hls => Box::new(HlsAdapter::new(Arc::new(SimulatedHls::with_media(media.clone())))),
        PlayerKind::Plyr => Box::new(PlyrAdapter::new(media.clone())),
        // element shows up on the second lookup, like a player still loading
        PlayerKind::Shaka => Box::new(ShakaAdapter::new(Arc::new(
            SimulatedShaka::available_from_lookup(media.clone(), 2),
        ))),
    }
}

/// Play a simulated video through a reporter
pub async fn simulate(config: ReporterConfig, options: SimulateOptions, format: &str) -> anyhow::Result<()> {
    let recorder = Arc::new(MemoryTransport::new());
    let transport: Arc<dyn ReportTransport> = if options.dry_run {
        recorder.clone() as Arc<dyn ReportTransport>
    } else {
        Arc::new(HttpTransport::new(&config)?)
    };

    let media = Arc::new(SimulatedMedia::new(options.duration));
    let mut reporter = PlaybackReporter::with_transport(config, transport)?;
    reporter
        .init(build_adapter(options.player, &media), VideoId::new(options.video.as_str()))
        .await?;

    if matches!(OutputFormat::from(format), OutputFormat::Text) {
        println!("Simulating {} session for video {}", options.player, options.video);
    }

    media.load_metadata();
    if options.player == PlayerKind::Shaka {
        // let discovery find the element before playback starts
        tokio::time::sleep(DISCOVERY_INTERVAL * 2).await;
    }
    media.play();

    let watched = play_for(&media, options.watch, options.pause_at).await;
    if !media.is_paused() {
        media.pause();
    }

    // pause report reaches the session before the timer stops
    tokio::time::sleep(STEP).await;
    let session = reporter.snapshot();
    reporter.teardown().await;
    tokio::time::sleep(DRAIN_GRACE).await;

    let summary = SimulationSummary {
        player: options.player,
        dry_run: options.dry_run,
        watched,
        session,
        reports: recorder.reports(),
    };

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", format_output(&summary, format)),
        OutputFormat::Text => {
            println!("\nSession Summary:");
            println!("  Watched: {:.2}s", summary.watched);
            if let Some(snapshot) = &summary.session {
                for line in snapshot_lines(snapshot) {
                    println!("{}", line);
                }
            }
            if options.dry_run {
                println!("\nReports ({}):", summary.reports.len());
                for report in &summary.reports {
                    println!("{}", report_line(report));
                }
            }
        }
    }

    Ok(())
}

/// Advance the simulated playhead in real time until `watch` seconds pass,
/// the content ends or Ctrl-C is pressed. Returns the seconds watched.
async fn play_for(media: &SimulatedMedia, watch: f64, pause_at: Option<f64>) -> f64 {
    let step = STEP.as_secs_f64();
    let mut ticker = tokio::time::interval(STEP);
    ticker.tick().await;
    let mut watched = 0.0;

    while watched < watch {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, tearing down");
                break;
            }
        }

        if media.is_paused() {
            info!(position = media.position(), "Playback stopped");
            break;
        }

        media.advance(step);
        watched += step;

        if pause_at.is_some_and(|at| watched >= at) {
            media.pause();
        }
    }

    watched
}

/// Send one `action_enter`
pub async fn enter(config: ReporterConfig, video: String, time: f64, first: bool, format: &str) -> anyhow::Result<()> {
    let transport = HttpTransport::new(&config)?;
    let report = EnterReport {
        id: VideoId::new(video),
        time,
        first_time: first,
    };

    let token = transport.enter(&report).await?;

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", format_output(&serde_json::json!({ "action": token }), format)),
        OutputFormat::Text => println!("Action token: {}", token),
    }
    Ok(())
}

/// Send one `action_update`
pub async fn update(
    config: ReporterConfig,
    video: String,
    time: f64,
    action: Option<String>,
    end: bool,
    sp: f64,
    format: &str,
) -> anyhow::Result<()> {
    let transport = HttpTransport::new(&config)?;
    let report = UpdateReport {
        id: VideoId::new(video),
        time,
        action: action.map(parse_action),
        end,
        sp,
    };

    transport.update(&report).await?;

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", format_output(&Report::Update(report), format)),
        OutputFormat::Text => println!("Update sent:\n{}", report_line(&Report::Update(report))),
    }
    Ok(())
}

/// Numeric tokens are sent as numbers, anything else as a string
fn parse_action(raw: String) -> ActionToken {
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value @ serde_json::Value::Number(_)) => ActionToken(value),
        _ => ActionToken::new(raw),
    }
}
