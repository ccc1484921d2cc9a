//! hls.js adapter
//!
//! Playback notifications come from the media element the hls.js instance is
//! attached to; the instance's own events are only logged.

use super::{PlaybackSignals, PlayerAdapter, Subscriptions};
use crate::{
    player::{HlsEvent, HlsPlayer, MediaElement, MediaEvent},
    Error, PlaybackEvent, Result,
};
use std::sync::Arc;
use tracing::debug;

/// Adapter for an hls.js instance
pub struct HlsAdapter {
    player: Arc<dyn HlsPlayer>,
    hls_subscriptions: Subscriptions<HlsEvent>,
    media_subscriptions: Option<(Arc<dyn MediaElement>, Subscriptions<MediaEvent>)>,
}

impl HlsAdapter {
    pub fn new(player: Arc<dyn HlsPlayer>) -> Self {
        Self {
            player,
            hls_subscriptions: Subscriptions::new(),
            media_subscriptions: None,
        }
    }

    fn media(&self) -> Result<Arc<dyn MediaElement>> {
        self.player
            .media()
            .ok_or(Error::MediaUnavailable { player: "hls" })
    }
}

impl PlayerAdapter for HlsAdapter {
    fn name(&self) -> &'static str {
        "hls"
    }

    fn attach_listeners(&mut self, signals: PlaybackSignals) -> Result<()> {
        let media = self.media()?;

        for event in [HlsEvent::MediaAttached, HlsEvent::ManifestParsed, HlsEvent::LevelLoaded] {
            self.hls_subscriptions.subscribe(
                self.player.as_ref(),
                event,
                Arc::new(move || debug!(player = "hls", event = event.as_str(), "HLS event")),
            );
        }

        let mut subscriptions = Subscriptions::new();
        for (event, signal) in [
            (MediaEvent::Play, PlaybackEvent::Play),
            (MediaEvent::Pause, PlaybackEvent::Pause),
            (MediaEvent::Ended, PlaybackEvent::Ended),
        ] {
            subscriptions.subscribe(media.as_ref(), event, signals.listener(signal));
        }

        debug!(
            hls_listeners = self.hls_subscriptions.len(),
            media_listeners = subscriptions.len(),
            "HLS.js listeners attached"
        );
        self.media_subscriptions = Some((media, subscriptions));
        Ok(())
    }

    fn detach_listeners(&mut self) {
        self.hls_subscriptions.clear(self.player.as_ref());
        if let Some((media, mut subscriptions)) = self.media_subscriptions.take() {
            subscriptions.clear(media.as_ref());
        }
    }

    fn is_playing(&self) -> Result<bool> {
        Ok(!self.media()?.paused())
    }

    fn current_time(&self) -> Result<f64> {
        Ok(self.media()?.current_time())
    }

    fn duration(&self) -> Result<f64> {
        Ok(self.media()?.duration())
    }
}

#[cfg(all(test, feature = "simulated"))]
mod tests {
    use super::*;
    use crate::player::simulated::{SimulatedHls, SimulatedMedia};

    #[test]
    fn test_attach_requires_media() {
        let hls = Arc::new(SimulatedHls::new());
        let mut adapter = HlsAdapter::new(hls.clone());
        let (signals, _rx) = PlaybackSignals::channel();

        assert!(matches!(
            adapter.attach_listeners(signals),
            Err(Error::MediaUnavailable { player: "hls" })
        ));
        assert!(adapter.is_playing().is_err());
    }

    #[test]
    fn test_media_events_forwarded() {
        let media = Arc::new(SimulatedMedia::new(60.0));
        let hls = Arc::new(SimulatedHls::with_media(media.clone()));
        let mut adapter = HlsAdapter::new(hls.clone());
        let (signals, mut rx) = PlaybackSignals::channel();

        adapter.attach_listeners(signals).unwrap();
        assert_eq!(hls.listener_count(HlsEvent::ManifestParsed), 1);
        assert_eq!(media.total_listeners(), 3);

        hls.emit(HlsEvent::ManifestParsed);
        media.play();
        media.advance(7.5);
        assert!(adapter.is_playing().unwrap());
        assert_eq!(adapter.current_time().unwrap(), 7.5);
        assert_eq!(adapter.duration().unwrap(), 60.0);
        assert_eq!(rx.try_recv().unwrap(), PlaybackEvent::Play);

        adapter.detach_listeners();
        assert_eq!(media.total_listeners(), 0);
        assert_eq!(hls.listener_count(HlsEvent::ManifestParsed), 0);
    }
}
