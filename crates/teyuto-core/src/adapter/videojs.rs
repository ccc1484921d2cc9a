//! video.js adapter

use super::{PlaybackSignals, PlayerAdapter, Subscriptions};
use crate::{
    player::{MediaEvent, VideoJsPlayer},
    PlaybackEvent, Result,
};
use std::sync::Arc;
use tracing::debug;

/// Adapter for a video.js player
pub struct VideoJsAdapter {
    player: Arc<dyn VideoJsPlayer>,
    subscriptions: Subscriptions<MediaEvent>,
}

impl VideoJsAdapter {
    pub fn new(player: Arc<dyn VideoJsPlayer>) -> Self {
        Self {
            player,
            subscriptions: Subscriptions::new(),
        }
    }
}

impl PlayerAdapter for VideoJsAdapter {
    fn name(&self) -> &'static str {
        "videojs"
    }

    fn attach_listeners(&mut self, signals: PlaybackSignals) -> Result<()> {
        let player = self.player.as_ref();
        let subs = &mut self.subscriptions;

        subs.subscribe(player, MediaEvent::Play, signals.listener(PlaybackEvent::Play));
        subs.subscribe(player, MediaEvent::Pause, signals.listener(PlaybackEvent::Pause));
        subs.subscribe(player, MediaEvent::Ended, signals.listener(PlaybackEvent::Ended));
        subs.subscribe(
            player,
            MediaEvent::LoadedMetadata,
            Arc::new(|| debug!(player = "videojs", "Metadata loaded")),
        );

        debug!(listeners = subs.len(), "Video.js listeners attached");
        Ok(())
    }

    fn detach_listeners(&mut self) {
        self.subscriptions.clear(self.player.as_ref());
    }

    fn is_playing(&self) -> Result<bool> {
        Ok(!self.player.paused())
    }

    fn current_time(&self) -> Result<f64> {
        Ok(self.player.current_time())
    }

    fn duration(&self) -> Result<f64> {
        Ok(self.player.duration())
    }
}
