//! Reporter configuration

use crate::{Error, Result, DEFAULT_API_URL};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Body encoding and header scheme for outbound reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportEncoding {
    /// JSON body, raw token in `Authorization`
    #[default]
    Json,
    /// Multipart form fields, `Authorization: Bearer <token>`
    Multipart,
}

/// Configuration for a playback reporter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Analytics API base URL
    pub api_url: String,
    /// Tenant channel identifier (required)
    pub channel: String,
    /// Optional bearer credential
    pub token: Option<String>,
    /// Body encoding / header scheme
    pub encoding: ReportEncoding,
    /// Polling period in milliseconds
    pub poll_interval_ms: u64,
    /// Watch time that triggers a progress flush (seconds)
    pub flush_threshold_secs: f64,
    /// Request timeout in milliseconds (none by default)
    pub request_timeout_ms: Option<u64>,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            channel: String::new(),
            token: None,
            encoding: ReportEncoding::Json,
            poll_interval_ms: 500,
            flush_threshold_secs: 20.0,
            request_timeout_ms: None,
        }
    }
}

impl ReporterConfig {
    /// Create a configuration for the given channel
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_encoding(mut self, encoding: ReportEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Check the configuration before a reporter is built from it
    pub fn validate(&self) -> Result<()> {
        if self.channel.trim().is_empty() {
            return Err(Error::MissingChannel);
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::config("poll_interval_ms must be greater than zero"));
        }
        if self.flush_threshold_secs.is_nan() || self.flush_threshold_secs <= 0.0 {
            return Err(Error::config("flush_threshold_secs must be positive"));
        }
        self.base_url()?;
        Ok(())
    }

    /// Parsed API base URL
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.api_url)?;
        if url.cannot_be_a_base() {
            return Err(Error::config(format!("api_url is not a base URL: {}", self.api_url)));
        }
        Ok(url)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReporterConfig::new("c1");
        assert_eq!(config.api_url, "https://api.teyuto.tv/v1");
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.flush_threshold_secs, 20.0);
        assert_eq!(config.encoding, ReportEncoding::Json);
        assert!(config.token.is_none());
        assert!(config.request_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_channel() {
        assert!(matches!(ReporterConfig::default().validate(), Err(Error::MissingChannel)));
        assert!(matches!(ReporterConfig::new("   ").validate(), Err(Error::MissingChannel)));
    }

    #[test]
    fn test_invalid_values() {
        let mut config = ReporterConfig::new("c1");
        config.poll_interval_ms = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = ReporterConfig::new("c1");
        config.flush_threshold_secs = 0.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = ReporterConfig::new("c1").with_api_url("not a url");
        assert!(matches!(config.validate(), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_from_json() {
        let config = ReporterConfig::from_json_str(
            r#"{"channel": "c1", "token": "t", "encoding": "multipart"}"#,
        )
        .unwrap();
        assert_eq!(config.channel, "c1");
        assert_eq!(config.token.as_deref(), Some("t"));
        assert_eq!(config.encoding, ReportEncoding::Multipart);
        assert_eq!(config.poll_interval_ms, 500);

        assert!(matches!(
            ReporterConfig::from_json_str(r#"{"token": "t"}"#),
            Err(Error::MissingChannel)
        ));
    }
}
