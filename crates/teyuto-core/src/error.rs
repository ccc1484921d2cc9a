//! Error types for Teyuto Core

use thiserror::Error;

/// Result type alias for reporter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reporter error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing channel identifier")]
    MissingChannel,

    // Contract errors
    #[error("{hook} must be implemented by a player adapter")]
    NotImplemented { hook: &'static str },

    #[error("Invalid reporter state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Reporter is not active (state: {0})")]
    Inactive(String),

    // Player errors
    #[error("Media element not available on {player} player")]
    MediaUnavailable { player: &'static str },

    #[error("Media element not found after {attempts} attempts")]
    MediaDiscoveryExhausted { attempts: u32 },

    // Network errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response from analytics endpoint: {0}")]
    InvalidResponse(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Create an invalid configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Returns true if this error is recoverable
    ///
    /// Recoverable errors affect a single report or lookup; the session keeps
    /// running after them.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Network(_)
                | Error::InvalidResponse(_)
                | Error::MediaUnavailable { .. }
        )
    }

    /// Returns the error code used in log records
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::MissingChannel => "MISSING_CHANNEL",
            Error::NotImplemented { .. } => "NOT_IMPLEMENTED",
            Error::InvalidStateTransition { .. } => "INVALID_STATE",
            Error::Inactive(_) => "INACTIVE",
            Error::MediaUnavailable { .. } => "MEDIA_UNAVAILABLE",
            Error::MediaDiscoveryExhausted { .. } => "MEDIA_DISCOVERY",
            Error::Network(_) => "NETWORK",
            Error::InvalidResponse(_) => "INVALID_RESPONSE",
            Error::Serialization(_) => "SERIALIZATION",
            Error::InvalidUrl(_) => "INVALID_URL",
        }
    }
}
