//! Output formatting for CLI

use serde::Serialize;
use teyuto_core::session::SessionSnapshot;
use teyuto_core::Report;

/// Output format options
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// Format output based on selected format
pub fn format_output<T: Serialize>(data: &T, format: &str) -> String {
    match OutputFormat::from(format) {
        OutputFormat::Json => {
            serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Text => {
            serde_json::to_string(data).unwrap_or_default()
        }
    }
}

/// One line per report
pub fn report_line(report: &Report) -> String {
    match report {
        Report::Enter(e) => format!(
            "  action_enter   id={} time={:.2} firstTime={}",
            e.id,
            e.time,
            u8::from(e.first_time)
        ),
        Report::Update(u) => format!(
            "  action_update  id={} time={:.2} action={} end={} sp={}",
            u.id,
            u.time,
            u.action.as_ref().map(|a| a.to_string()).unwrap_or_else(|| "-".to_string()),
            u8::from(u.end),
            u.sp
        ),
    }
}

/// Session summary block
pub fn snapshot_lines(snapshot: &SessionSnapshot) -> Vec<String> {
    vec![
        format!("  Session: {}", snapshot.session_id),
        format!("  Video: {}", snapshot.video_id),
        format!("  Ticks: {}", snapshot.ticks),
        format!("  Flushes: {}", snapshot.flushes),
        format!("  Unflushed seconds: {}", snapshot.seconds_played),
        format!(
            "  Action: {}",
            snapshot
                .current_action
                .as_ref()
                .map(|a| a.to_string())
                .unwrap_or_else(|| "none".to_string())
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use teyuto_core::{ActionToken, EnterReport, UpdateReport, VideoId};

    #[test]
    fn test_report_lines() {
        let enter = Report::Enter(EnterReport {
            id: VideoId::new("v1"),
            time: 1.5,
            first_time: true,
        });
        assert_eq!(report_line(&enter), "  action_enter   id=v1 time=1.50 firstTime=1");

        let update = Report::Update(UpdateReport {
            id: VideoId::new("v1"),
            time: 20.0,
            action: Some(ActionToken::new(3)),
            end: false,
            sp: 0.0,
        });
        assert_eq!(
            report_line(&update),
            "  action_update  id=v1 time=20.00 action=3 end=0 sp=0"
        );
    }

    #[test]
    fn test_format_json() {
        let out = format_output(&serde_json::json!({ "a": 1 }), "JSON");
        assert!(out.contains("\"a\": 1"));
    }
}
