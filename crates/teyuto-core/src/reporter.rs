//! Playback Reporter - session driver
//!
//! Coordinates:
//! - Adapter listener attachment and removal
//! - The fixed-period polling timer
//! - Dispatch of enter / progress reports
//! - Application of enter acknowledgements
//!
//! One task per session owns the [`Session`] and the adapter. Player
//! notifications, timer ticks and enter acknowledgements all arrive on that
//! task, so each runs to completion before the next one starts. Reports are
//! spawned and never awaited; failures are logged and dropped.

use crate::{
    adapter::{PlaybackSignals, PlayerAdapter},
    config::ReporterConfig,
    payload::Report,
    session::{Session, SessionSnapshot},
    transport::{HttpTransport, ReportTransport},
    ActionToken, Error, PlaybackEvent, ReporterState, Result, SessionId, VideoId,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, trace, warn, Instrument};

/// Running session task
struct SessionTask {
    handle: JoinHandle<()>,
    shutdown: oneshot::Sender<()>,
    signals: PlaybackSignals,
}

/// Playback reporter for a single player
pub struct PlaybackReporter {
    /// Unique session ID
    id: SessionId,
    /// Reporter configuration
    config: ReporterConfig,
    /// Report delivery
    transport: Arc<dyn ReportTransport>,
    /// Lifecycle state
    state: ReporterState,
    /// Latest session snapshot, kept after teardown
    snapshot: Option<watch::Receiver<SessionSnapshot>>,
    /// Polling task, present while active
    task: Option<SessionTask>,
}

impl PlaybackReporter {
    /// Create a reporter that posts to the configured analytics API
    pub fn new(config: ReporterConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Self::with_transport(config, transport)
    }

    /// Create a reporter with a custom transport
    pub fn with_transport(config: ReporterConfig, transport: Arc<dyn ReportTransport>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            id: SessionId::new(),
            config,
            transport,
            state: ReporterState::Uninitialized,
            snapshot: None,
            task: None,
        })
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Get lifecycle state
    pub fn state(&self) -> ReporterState {
        self.state
    }

    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    /// True while the polling timer is live
    pub fn is_polling(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.handle.is_finished())
    }

    /// Latest session state, if `init` has run
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.snapshot.as_ref().map(|rx| rx.borrow().clone())
    }

    /// Watch session snapshots as they change
    pub fn subscribe(&self) -> Option<watch::Receiver<SessionSnapshot>> {
        self.snapshot.clone()
    }

    fn transition(&mut self, to: ReporterState) -> Result<()> {
        if !self.state.can_transition_to(to) {
            return Err(Error::InvalidStateTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        info!(session_id = %self.id, from = %self.state, to = %to, "Reporter state transition");
        self.state = to;
        Ok(())
    }

    /// Attach the adapter's listeners and start the polling timer
    #[instrument(skip(self, adapter, video_id), fields(session_id = %self.id, player = adapter.name()))]
    pub async fn init(
        &mut self,
        mut adapter: Box<dyn PlayerAdapter>,
        video_id: impl Into<VideoId>,
    ) -> Result<()> {
        if !self.state.can_transition_to(ReporterState::Active) {
            return Err(Error::InvalidStateTransition {
                from: self.state.to_string(),
                to: ReporterState::Active.to_string(),
            });
        }

        let video_id = video_id.into();
        let (signals, events) = PlaybackSignals::channel();
        adapter.attach_listeners(signals.clone())?;

        let session = Session::new(self.id, video_id.clone(), &self.config);
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let driver = SessionDriver {
            session,
            adapter,
            transport: self.transport.clone(),
            snapshot: snapshot_tx,
        };
        let handle = tokio::spawn(
            driver
                .run(events, shutdown_rx, self.config.poll_interval())
                .in_current_span(),
        );

        self.task = Some(SessionTask {
            handle,
            shutdown: shutdown_tx,
            signals,
        });
        self.snapshot = Some(snapshot_rx);
        self.transition(ReporterState::Active)?;

        info!(video_id = %video_id, "Reporter initialized");
        Ok(())
    }

    /// Forward a play notification, as a player listener would
    pub fn on_play(&self) -> Result<()> {
        self.notify(PlaybackEvent::Play)
    }

    /// Forward a pause notification
    pub fn on_pause(&self) -> Result<()> {
        self.notify(PlaybackEvent::Pause)
    }

    /// Forward an ended notification
    pub fn on_ended(&self) -> Result<()> {
        self.notify(PlaybackEvent::Ended)
    }

    fn notify(&self, event: PlaybackEvent) -> Result<()> {
        match &self.task {
            Some(task) => {
                task.signals.send(event);
                Ok(())
            }
            None => Err(Error::Inactive(self.state.to_string())),
        }
    }

    /// Stop the polling timer and remove the adapter's listeners
    ///
    /// Safe to call more than once. Reports already dispatched are not
    /// cancelled.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn teardown(&mut self) {
        let Some(task) = self.task.take() else {
            if self.state == ReporterState::Uninitialized {
                self.state = ReporterState::TornDown;
            }
            debug!(state = %self.state, "Teardown with no running session");
            return;
        };

        let _ = task.shutdown.send(());
        if let Err(e) = task.handle.await {
            warn!(error = %e, "Session task ended abnormally");
        }

        if let Err(e) = self.transition(ReporterState::TornDown) {
            warn!(error = %e, "Unexpected state at teardown");
            self.state = ReporterState::TornDown;
        }
    }
}

/// State owned by the session task
struct SessionDriver {
    session: Session,
    adapter: Box<dyn PlayerAdapter>,
    transport: Arc<dyn ReportTransport>,
    snapshot: watch::Sender<SessionSnapshot>,
}

impl SessionDriver {
    async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<PlaybackEvent>,
        mut shutdown: oneshot::Receiver<()>,
        poll_interval: Duration,
    ) {
        let (ack_tx, mut acks) = mpsc::unbounded_channel::<ActionToken>();
        let mut ticker = time::interval_at(Instant::now() + poll_interval, poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(interval_ms = poll_interval.as_millis() as u64, "Polling started");

        loop {
            tokio::select! {
                biased;

                // fires on teardown or when the reporter is dropped
                _ = &mut shutdown => break,

                Some(event) = events.recv() => self.handle_event(event, &ack_tx),

                Some(token) = acks.recv() => self.session.accept_action(token),

                _ = ticker.tick() => self.handle_tick(&ack_tx),
            }

            self.snapshot.send_replace(self.session.snapshot());
        }

        self.adapter.detach_listeners();
        let snapshot = self.session.snapshot();
        info!(ticks = snapshot.ticks, flushes = snapshot.flushes, "Polling stopped");
    }

    fn handle_tick(&mut self, ack_tx: &mpsc::UnboundedSender<ActionToken>) {
        match self.session.tick(self.adapter.as_ref()) {
            Ok(Some(report)) => self.dispatch(Report::Update(report), ack_tx),
            Ok(None) => {}
            Err(e) => trace!(code = e.error_code(), error = %e, "Tick skipped"),
        }
    }

    fn handle_event(&mut self, event: PlaybackEvent, ack_tx: &mpsc::UnboundedSender<ActionToken>) {
        debug!(event = %event, "Player event");
        match self.session.handle_event(event, self.adapter.as_ref()) {
            Ok(report) => self.dispatch(report, ack_tx),
            Err(e) => warn!(event = %event, code = e.error_code(), error = %e, "Event not reported"),
        }
    }

    /// Fire-and-forget delivery
    fn dispatch(&self, report: Report, ack_tx: &mpsc::UnboundedSender<ActionToken>) {
        let transport = self.transport.clone();
        let ack_tx = ack_tx.clone();
        let function = report.function();

        tokio::spawn(
            async move {
                let outcome = match report {
                    Report::Enter(enter) => transport.enter(&enter).await.map(|token| {
                        // receiver is gone once the session has stopped
                        let _ = ack_tx.send(token);
                    }),
                    Report::Update(update) => transport.update(&update).await,
                };

                match outcome {
                    Ok(()) => debug!(function, "Report delivered"),
                    Err(e) => warn!(function, code = e.error_code(), error = %e, "Report dropped"),
                }
            }
            .in_current_span(),
        );
    }
}

impl Drop for PlaybackReporter {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.shutdown.send(());
        }
    }
}

#[cfg(all(test, feature = "simulated"))]
mod tests {
    use super::*;
    use crate::adapter::VideoJsAdapter;
    use crate::player::simulated::SimulatedMedia;
    use crate::transport::MemoryTransport;

    fn reporter(transport: Arc<MemoryTransport>) -> PlaybackReporter {
        PlaybackReporter::with_transport(ReporterConfig::new("c1"), transport).unwrap()
    }

    #[test]
    fn test_requires_channel() {
        let transport = Arc::new(MemoryTransport::new());
        assert!(matches!(
            PlaybackReporter::with_transport(ReporterConfig::default(), transport),
            Err(Error::MissingChannel)
        ));
        assert!(matches!(
            PlaybackReporter::new(ReporterConfig::new("")),
            Err(Error::MissingChannel)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifecycle() {
        let transport = Arc::new(MemoryTransport::new());
        let media = Arc::new(SimulatedMedia::new(120.0));
        let mut reporter = reporter(transport);

        assert_eq!(reporter.state(), ReporterState::Uninitialized);
        assert!(!reporter.is_polling());
        assert!(reporter.on_play().is_err());

        reporter
            .init(Box::new(VideoJsAdapter::new(media.clone())), "v42")
            .await
            .unwrap();
        assert_eq!(reporter.state(), ReporterState::Active);
        assert!(reporter.is_polling());
        assert_eq!(media.total_listeners(), 4);

        let again = reporter
            .init(Box::new(VideoJsAdapter::new(media.clone())), "v42")
            .await;
        assert!(matches!(again, Err(Error::InvalidStateTransition { .. })));

        reporter.teardown().await;
        assert_eq!(reporter.state(), ReporterState::TornDown);
        assert!(!reporter.is_polling());
        assert_eq!(media.total_listeners(), 0);

        reporter.teardown().await;
        assert_eq!(reporter.state(), ReporterState::TornDown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_notifications() {
        let transport = Arc::new(MemoryTransport::new());
        let media = Arc::new(SimulatedMedia::new(120.0));
        let mut reporter = reporter(transport.clone());
        reporter
            .init(Box::new(VideoJsAdapter::new(media.clone())), "v42")
            .await
            .unwrap();

        media.seek(33.0);
        reporter.on_pause().unwrap();
        reporter.on_ended().unwrap();
        time::sleep(Duration::from_millis(10)).await;

        let updates = transport.updates();
        assert_eq!(updates.len(), 2);
        assert!(updates.iter().any(|u| u.time == 33.0));
        assert!(updates.iter().any(|u| u.time == 120.0));
        assert!(updates.iter().all(|u| u.end));

        reporter.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_detaches_listeners() {
        let transport = Arc::new(MemoryTransport::new());
        let media = Arc::new(SimulatedMedia::new(120.0));
        {
            let mut reporter = reporter(transport);
            reporter
                .init(Box::new(VideoJsAdapter::new(media.clone())), "v42")
                .await
                .unwrap();
        }
        time::sleep(Duration::from_millis(10)).await;
        assert_eq!(media.total_listeners(), 0);
    }
}
