//! Reporting session state
//!
//! A [`Session`] is the single mutable state of one reporter: watch-time
//! accumulator, action token and first-entry flag. It never performs I/O; each
//! operation returns the report to send and the reporter dispatches it.

use crate::{
    adapter::PlayerAdapter,
    config::ReporterConfig,
    payload::{EnterReport, Report, UpdateReport},
    ActionToken, PlaybackEvent, Result, SessionId, VideoId,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Reporting state for one playback session
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    video_id: VideoId,
    current_action: Option<ActionToken>,
    seconds_played: f64,
    first_time_enter: bool,
    tick_secs: f64,
    flush_threshold: f64,
    ticks: u64,
    flushes: u64,
}

impl Session {
    pub fn new(id: SessionId, video_id: VideoId, config: &ReporterConfig) -> Self {
        Self {
            id,
            video_id,
            current_action: None,
            seconds_played: 0.0,
            first_time_enter: true,
            tick_secs: config.poll_interval().as_secs_f64(),
            flush_threshold: config.flush_threshold_secs,
            ticks: 0,
            flushes: 0,
        }
    }

    /// Polling tick
    ///
    /// While the player is playing, one poll period is added to the
    /// accumulator. Reaching the flush threshold resets the accumulator to 0
    /// and yields a progress report built after the reset, so its `sp` is 0.
    /// If the playhead cannot be read the accumulator is left untouched.
    pub fn tick(&mut self, adapter: &dyn PlayerAdapter) -> Result<Option<UpdateReport>> {
        self.ticks += 1;

        if !adapter.is_playing()? {
            return Ok(None);
        }

        self.seconds_played += self.tick_secs;
        if self.seconds_played < self.flush_threshold {
            return Ok(None);
        }

        let time = adapter.current_time()?;
        self.seconds_played = 0.0;
        self.flushes += 1;
        debug!(session_id = %self.id, time, "Flushing watch time");

        Ok(Some(self.progress_report(time, false)))
    }

    /// Report for a player notification
    pub fn handle_event(&self, event: PlaybackEvent, adapter: &dyn PlayerAdapter) -> Result<Report> {
        Ok(match event {
            PlaybackEvent::Play => Report::Enter(self.on_play(adapter)?),
            PlaybackEvent::Pause => Report::Update(self.on_pause(adapter)?),
            PlaybackEvent::Ended => Report::Update(self.on_ended(adapter)?),
        })
    }

    pub fn on_play(&self, adapter: &dyn PlayerAdapter) -> Result<EnterReport> {
        Ok(self.enter_report(adapter.current_time()?))
    }

    pub fn on_pause(&self, adapter: &dyn PlayerAdapter) -> Result<UpdateReport> {
        Ok(self.progress_report(adapter.current_time()?, true))
    }

    /// Ended reports the duration, not the playhead
    pub fn on_ended(&self, adapter: &dyn PlayerAdapter) -> Result<UpdateReport> {
        Ok(self.progress_report(adapter.duration()?, true))
    }

    pub fn enter_report(&self, time: f64) -> EnterReport {
        EnterReport {
            id: self.video_id.clone(),
            time,
            first_time: self.first_time_enter,
        }
    }

    pub fn progress_report(&self, time: f64, end: bool) -> UpdateReport {
        UpdateReport {
            id: self.video_id.clone(),
            time,
            action: self.current_action.clone(),
            end,
            sp: self.seconds_played,
        }
    }

    /// Apply an acknowledged enter: store the token, clear the first-entry flag
    pub fn accept_action(&mut self, token: ActionToken) {
        debug!(session_id = %self.id, action = %token, "Action token assigned");
        self.current_action = Some(token);
        self.first_time_enter = false;
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    pub fn seconds_played(&self) -> f64 {
        self.seconds_played
    }

    pub fn current_action(&self) -> Option<&ActionToken> {
        self.current_action.as_ref()
    }

    pub fn first_time_enter(&self) -> bool {
        self.first_time_enter
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            video_id: self.video_id.clone(),
            seconds_played: self.seconds_played,
            current_action: self.current_action.clone(),
            first_time_enter: self.first_time_enter,
            ticks: self.ticks,
            flushes: self.flushes,
        }
    }
}

/// Point-in-time view of a session, published after every event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub video_id: VideoId,
    pub seconds_played: f64,
    pub current_action: Option<ActionToken>,
    pub first_time_enter: bool,
    /// Polling ticks processed
    pub ticks: u64,
    /// Progress flushes triggered by the accumulator
    pub flushes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::cell::Cell;

    struct FakePlayer {
        playing: Cell<bool>,
        time: Cell<f64>,
        time_unavailable: Cell<bool>,
        duration: f64,
    }

    impl FakePlayer {
        fn new(playing: bool) -> Self {
            Self {
                playing: Cell::new(playing),
                time: Cell::new(0.0),
                time_unavailable: Cell::new(false),
                duration: 300.0,
            }
        }
    }

    impl PlayerAdapter for FakePlayer {
        fn is_playing(&self) -> Result<bool> {
            Ok(self.playing.get())
        }

        fn current_time(&self) -> Result<f64> {
            if self.time_unavailable.get() {
                return Err(Error::MediaUnavailable { player: "fake" });
            }
            Ok(self.time.get())
        }

        fn duration(&self) -> Result<f64> {
            Ok(self.duration)
        }
    }

    struct Unbound;
    impl PlayerAdapter for Unbound {}

    fn session() -> Session {
        Session::new(SessionId::new(), VideoId::new("v42"), &ReporterConfig::new("c1"))
    }

    #[test]
    fn test_no_accumulation_while_paused() {
        let mut session = session();
        let player = FakePlayer::new(false);
        for _ in 0..100 {
            assert!(session.tick(&player).unwrap().is_none());
        }
        assert_eq!(session.seconds_played(), 0.0);
        assert_eq!(session.snapshot().ticks, 100);
    }

    #[test]
    fn test_flush_at_threshold() {
        let mut session = session();
        let player = FakePlayer::new(true);
        player.time.set(61.0);

        let mut reports = Vec::new();
        for _ in 0..44 {
            if let Some(report) = session.tick(&player).unwrap() {
                reports.push(report);
            }
            assert!(session.seconds_played() < 20.0);
        }

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].sp, 0.0);
        assert_eq!(reports[0].time, 61.0);
        assert!(!reports[0].end);
        assert_eq!(session.seconds_played(), 2.0);
        assert_eq!(session.snapshot().flushes, 1);
    }

    #[test]
    fn test_failed_flush_keeps_watch_time() {
        let mut session = session();
        let player = FakePlayer::new(true);
        player.time.set(30.0);
        for _ in 0..39 {
            assert!(session.tick(&player).unwrap().is_none());
        }

        player.time_unavailable.set(true);
        assert!(matches!(session.tick(&player), Err(Error::MediaUnavailable { .. })));
        assert_eq!(session.seconds_played(), 20.0);
        assert_eq!(session.snapshot().flushes, 0);

        player.time_unavailable.set(false);
        let report = session.tick(&player).unwrap().unwrap();
        assert_eq!(report.sp, 0.0);
        assert_eq!(report.time, 30.0);
        assert_eq!(session.seconds_played(), 0.0);
        assert_eq!(session.snapshot().flushes, 1);
    }

    #[test]
    fn test_accumulates_only_while_playing() {
        let mut session = session();
        let player = FakePlayer::new(true);
        for _ in 0..10 {
            session.tick(&player).unwrap();
        }
        player.playing.set(false);
        for _ in 0..10 {
            session.tick(&player).unwrap();
        }
        assert_eq!(session.seconds_played(), 5.0);
    }

    #[test]
    fn test_first_time_flag() {
        let mut session = session();
        let player = FakePlayer::new(true);
        player.time.set(4.0);

        let first = session.on_play(&player).unwrap();
        assert!(first.first_time);
        assert_eq!(first.time, 4.0);

        // still first until the endpoint acknowledges
        assert!(session.on_play(&player).unwrap().first_time);

        session.accept_action(ActionToken::new(9));
        assert!(!session.on_play(&player).unwrap().first_time);
        assert!(!session.first_time_enter());
    }

    #[test]
    fn test_pause_and_ended_reports() {
        let mut session = session();
        let player = FakePlayer::new(true);
        player.time.set(42.5);
        session.accept_action(ActionToken::new("a7"));
        for _ in 0..3 {
            session.tick(&player).unwrap();
        }

        let pause = session.on_pause(&player).unwrap();
        assert!(pause.end);
        assert_eq!(pause.time, 42.5);
        assert_eq!(pause.sp, 1.5);
        assert_eq!(pause.action, Some(ActionToken::new("a7")));

        let ended = session.on_ended(&player).unwrap();
        assert!(ended.end);
        assert_eq!(ended.time, 300.0);
    }

    #[test]
    fn test_handle_event_maps_to_calls() {
        let session = session();
        let player = FakePlayer::new(true);
        assert_eq!(
            session.handle_event(PlaybackEvent::Play, &player).unwrap().function(),
            "action_enter"
        );
        assert_eq!(
            session.handle_event(PlaybackEvent::Ended, &player).unwrap().function(),
            "action_update"
        );
    }

    #[test]
    fn test_unbound_adapter_errors() {
        let mut session = session();
        assert!(matches!(
            session.tick(&Unbound),
            Err(Error::NotImplemented { hook: "is_playing" })
        ));
        assert!(matches!(
            session.on_ended(&Unbound),
            Err(Error::NotImplemented { hook: "duration" })
        ));
    }
}
