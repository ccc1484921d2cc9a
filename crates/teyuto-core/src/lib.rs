//! Teyuto Core - Player Analytics for Teyuto
//!
//! This crate attaches to a media player and reports playback telemetry:
//! - Play / pause / ended notifications
//! - Watch time accumulated by a fixed 500 ms polling timer
//! - Periodic flushes of watch time to the analytics endpoint
//! - One adapter per player library (video.js, hls.js, Plyr, Shaka)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Teyuto Core                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │   VideoJs    │  │   Hls /      │  │    Shaka     │           │
//! │  │   Adapter    │  │   Plyr       │  │   Adapter    │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │ PlayerAdapter                       │
//! │                    ┌──────┴──────┐                              │
//! │                    │  Playback   │  500 ms ticker               │
//! │                    │  Reporter   │◄──────────────               │
//! │                    └──────┬──────┘                              │
//! │                           │                                     │
//! │                    ┌──────┴──────┐                              │
//! │                    │  Transport  │  action_enter / action_update│
//! │                    └─────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use teyuto_core::{PlaybackReporter, ReporterConfig, VideoJsAdapter, VideoId};
//! use teyuto_core::player::simulated::SimulatedMedia;
//!
//! # async fn run() -> teyuto_core::Result<()> {
//! let player = Arc::new(SimulatedMedia::new(120.0));
//! let config = ReporterConfig::new("your-channel-public").with_token("user-token");
//!
//! let mut reporter = PlaybackReporter::new(config)?;
//! reporter.init(Box::new(VideoJsAdapter::new(player)), VideoId::new("video-id")).await?;
//!
//! // ... playback happens ...
//!
//! reporter.teardown().await;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod payload;
pub mod transport;
pub mod player;
pub mod adapter;
pub mod session;
pub mod reporter;

pub use error::{Error, Result};
pub use types::*;
pub use config::{ReporterConfig, ReportEncoding};
pub use payload::{EnterReport, UpdateReport, Report};
pub use transport::{HttpTransport, ReportTransport};
pub use adapter::{PlayerAdapter, PlaybackSignals, VideoJsAdapter, HlsAdapter, PlyrAdapter, ShakaAdapter};
pub use session::Session;
pub use reporter::PlaybackReporter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default analytics API base URL
pub const DEFAULT_API_URL: &str = "https://api.teyuto.tv/v1";
