//! Core types for Teyuto Core

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a reporting session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque content identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VideoId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for VideoId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-issued action token
///
/// Returned by `action_enter` and echoed back verbatim on every
/// `action_update`. The endpoint may hand out numbers or strings, so the raw
/// JSON value is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionToken(pub serde_json::Value);

impl ActionToken {
    pub fn new(value: impl Into<serde_json::Value>) -> Self {
        Self(value.into())
    }

    /// Returns true if the token carries no usable value
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Textual form used for multipart form fields
    pub fn to_form_value(&self) -> String {
        match &self.0 {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl std::fmt::Display for ActionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_form_value())
    }
}

/// Reporter lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReporterState {
    /// Constructed, `init` not yet called
    Uninitialized,
    /// Listeners attached, polling timer running
    Active,
    /// Timer cancelled, listeners removed
    TornDown,
}

impl ReporterState {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: ReporterState) -> bool {
        use ReporterState::*;
        matches!(
            (self, target),
            (Uninitialized, Active) | (Uninitialized, TornDown) | (Active, TornDown)
        )
    }
}

impl std::fmt::Display for ReporterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReporterState::Uninitialized => write!(f, "uninitialized"),
            ReporterState::Active => write!(f, "active"),
            ReporterState::TornDown => write!(f, "torn_down"),
        }
    }
}

/// Playback notification forwarded from a player to the reporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackEvent {
    Play,
    Pause,
    Ended,
}

impl std::fmt::Display for PlaybackEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackEvent::Play => write!(f, "play"),
            PlaybackEvent::Pause => write!(f, "pause"),
            PlaybackEvent::Ended => write!(f, "ended"),
        }
    }
}

/// Supported player libraries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    VideoJs,
    Hls,
    Plyr,
    Shaka,
}

impl PlayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerKind::VideoJs => "videojs",
            PlayerKind::Hls => "hls",
            PlayerKind::Plyr => "plyr",
            PlayerKind::Shaka => "shaka",
        }
    }
}

impl std::fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerKind::VideoJs => write!(f, "Video.js"),
            PlayerKind::Hls => write!(f, "HLS.js"),
            PlayerKind::Plyr => write!(f, "Plyr"),
            PlayerKind::Shaka => write!(f, "Shaka Player"),
        }
    }
}
