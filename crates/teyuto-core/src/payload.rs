//! Report payloads for the analytics endpoint
//!
//! Two calls exist: `action_enter` when playback starts and `action_update`
//! for progress flushes, pauses and the end of the content. Boolean flags go
//! over the wire as `1` / `0`.

use crate::{ActionToken, Error, Result, VideoId};
use serde::{Deserialize, Serialize};

/// Payload for `?f=action_enter`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnterReport {
    pub id: VideoId,
    /// Playback position in seconds
    pub time: f64,
    /// Set on the first enter of a session
    #[serde(with = "flag")]
    pub first_time: bool,
}

impl EnterReport {
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("id", self.id.to_string()),
            ("time", self.time.to_string()),
            ("firstTime", flag::text(self.first_time)),
        ]
    }
}

/// Payload for `?f=action_update`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub id: VideoId,
    /// Playback position (or duration, on end) in seconds
    pub time: f64,
    /// Token from the last acknowledged enter, `null` before one arrives
    pub action: Option<ActionToken>,
    #[serde(with = "flag")]
    pub end: bool,
    /// Accumulated seconds played
    pub sp: f64,
}

impl UpdateReport {
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("id", self.id.to_string()),
            ("time", self.time.to_string()),
            (
                "action",
                self.action.as_ref().map(ActionToken::to_form_value).unwrap_or_default(),
            ),
            ("end", flag::text(self.end)),
            ("sp", self.sp.to_string()),
        ]
    }
}

/// Outbound report produced by a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum Report {
    #[serde(rename = "action_enter")]
    Enter(EnterReport),
    #[serde(rename = "action_update")]
    Update(UpdateReport),
}

impl Report {
    /// Query value of the `f` parameter for this report
    pub fn function(&self) -> &'static str {
        match self {
            Report::Enter(_) => "action_enter",
            Report::Update(_) => "action_update",
        }
    }
}

/// One element of the `action_enter` response
#[derive(Debug, Clone, Deserialize)]
struct EnterAck {
    #[serde(default)]
    action: Option<ActionToken>,
}

/// Extract the action token from an `action_enter` response body
///
/// The endpoint answers with an array; the first element's `action` is the
/// token. An empty array, a missing or null `action`, or a body that is not an
/// array is rejected.
pub fn parse_enter_response(body: &[u8]) -> Result<ActionToken> {
    let acks: Vec<EnterAck> = serde_json::from_slice(body)
        .map_err(|e| Error::InvalidResponse(format!("malformed enter response: {e}")))?;

    let first = acks
        .into_iter()
        .next()
        .ok_or_else(|| Error::InvalidResponse("empty enter response".to_string()))?;

    match first.action {
        Some(token) if !token.is_null() => Ok(token),
        _ => Err(Error::InvalidResponse("enter response has no action".to_string())),
    }
}

mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(u8::deserialize(deserializer)? != 0)
    }

    pub fn text(value: bool) -> String {
        u8::from(value).to_string()
    }
}
