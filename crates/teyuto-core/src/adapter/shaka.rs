//! Shaka Player adapter
//!
//! Shaka exposes its media element asynchronously, so attaching starts a
//! discovery task that looks the element up every 500 ms. After ten misses
//! discovery stops for good and the session runs without playback telemetry.

use super::{PlaybackSignals, PlayerAdapter, Subscriptions};
use crate::{
    player::{MediaElement, MediaEvent, ShakaPlayer},
    Error, PlaybackEvent, Result,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn, Instrument};

/// Delay between two media element lookups
pub const DISCOVERY_INTERVAL: Duration = Duration::from_millis(500);

/// Lookups made before discovery gives up
pub const MAX_DISCOVERY_ATTEMPTS: u32 = 10;

/// Progress of the media element lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStatus {
    /// `attach_listeners` not called yet
    Idle,
    /// Still looking; `attempts` lookups made so far
    Searching { attempts: u32 },
    /// Listeners attached on lookup number `attempt`
    Attached { attempt: u32 },
    /// Every lookup missed
    Exhausted { attempts: u32 },
    /// Listeners removed
    Detached,
}

struct Attachment {
    status: DiscoveryStatus,
    element: Option<(Arc<dyn MediaElement>, Subscriptions<MediaEvent>)>,
}

/// Adapter for a Shaka Player instance
pub struct ShakaAdapter {
    player: Arc<dyn ShakaPlayer>,
    attachment: Arc<Mutex<Attachment>>,
    discovery: Option<JoinHandle<()>>,
    interval: Duration,
    max_attempts: u32,
}

impl ShakaAdapter {
    pub fn new(player: Arc<dyn ShakaPlayer>) -> Self {
        Self {
            player,
            attachment: Arc::new(Mutex::new(Attachment {
                status: DiscoveryStatus::Idle,
                element: None,
            })),
            discovery: None,
            interval: DISCOVERY_INTERVAL,
            max_attempts: MAX_DISCOVERY_ATTEMPTS,
        }
    }

    /// Override the lookup schedule
    pub fn with_discovery(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.interval = interval;
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn discovery_status(&self) -> DiscoveryStatus {
        self.attachment.lock().status
    }

    fn element(&self) -> Result<Arc<dyn MediaElement>> {
        let attachment = self.attachment.lock();
        match (&attachment.element, attachment.status) {
            (Some((element, _)), _) => Ok(element.clone()),
            (None, DiscoveryStatus::Exhausted { attempts }) => {
                Err(Error::MediaDiscoveryExhausted { attempts })
            }
            (None, _) => Err(Error::MediaUnavailable { player: "shaka" }),
        }
    }
}

async fn discover(
    player: Arc<dyn ShakaPlayer>,
    attachment: Arc<Mutex<Attachment>>,
    signals: PlaybackSignals,
    interval: Duration,
    max_attempts: u32,
) {
    let mut ticker = tokio::time::interval(interval);

    for attempt in 1..=max_attempts {
        ticker.tick().await;

        // the lookup runs without the lock; a detach may land meanwhile
        let element = player.media_element();
        let mut state = attachment.lock();
        if state.status == DiscoveryStatus::Detached {
            debug!(attempt, "Shaka discovery cancelled");
            return;
        }

        let Some(element) = element else {
            debug!(attempt, max_attempts, "Shaka media element not ready");
            state.status = DiscoveryStatus::Searching { attempts: attempt };
            continue;
        };

        let mut subscriptions = Subscriptions::new();
        for (event, signal) in [
            (MediaEvent::Play, PlaybackEvent::Play),
            (MediaEvent::Pause, PlaybackEvent::Pause),
            (MediaEvent::Ended, PlaybackEvent::Ended),
        ] {
            subscriptions.subscribe(element.as_ref(), event, signals.listener(signal));
        }

        state.element = Some((element, subscriptions));
        state.status = DiscoveryStatus::Attached { attempt };
        debug!(attempt, "Shaka listeners attached");
        return;
    }

    let mut state = attachment.lock();
    if state.status == DiscoveryStatus::Detached {
        return;
    }
    state.status = DiscoveryStatus::Exhausted { attempts: max_attempts };
    drop(state);

    let err = Error::MediaDiscoveryExhausted { attempts: max_attempts };
    warn!(code = err.error_code(), error = %err, "Giving up on Shaka listener attachment");
}

impl PlayerAdapter for ShakaAdapter {
    fn name(&self) -> &'static str {
        "shaka"
    }

    fn attach_listeners(&mut self, signals: PlaybackSignals) -> Result<()> {
        let runtime = Handle::try_current()
            .map_err(|_| Error::config("Shaka adapter requires a Tokio runtime"))?;

        if let Some(previous) = self.discovery.take() {
            previous.abort();
        }
        self.attachment.lock().status = DiscoveryStatus::Searching { attempts: 0 };

        let task = discover(
            self.player.clone(),
            self.attachment.clone(),
            signals,
            self.interval,
            self.max_attempts,
        );
        self.discovery = Some(runtime.spawn(task.in_current_span()));
        Ok(())
    }

    fn detach_listeners(&mut self) {
        if let Some(discovery) = self.discovery.take() {
            discovery.abort();
        }

        let mut attachment = self.attachment.lock();
        if let Some((element, mut subscriptions)) = attachment.element.take() {
            subscriptions.clear(element.as_ref());
        }
        if attachment.status != DiscoveryStatus::Idle {
            attachment.status = DiscoveryStatus::Detached;
        }
    }

    fn is_playing(&self) -> Result<bool> {
        Ok(!self.element()?.paused())
    }

    fn current_time(&self) -> Result<f64> {
        Ok(self.element()?.current_time())
    }

    fn duration(&self) -> Result<f64> {
        Ok(self.element()?.duration())
    }
}

impl Drop for ShakaAdapter {
    fn drop(&mut self) {
        self.detach_listeners();
    }
}
