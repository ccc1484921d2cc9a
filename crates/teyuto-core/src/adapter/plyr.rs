//! Plyr adapter

use super::{PlaybackSignals, PlayerAdapter, Subscriptions};
use crate::{
    player::{MediaEvent, PlyrPlayer},
    PlaybackEvent, Result,
};
use std::sync::Arc;
use tracing::debug;

/// Adapter for a Plyr player
pub struct PlyrAdapter {
    player: Arc<dyn PlyrPlayer>,
    subscriptions: Subscriptions<MediaEvent>,
}

impl PlyrAdapter {
    pub fn new(player: Arc<dyn PlyrPlayer>) -> Self {
        Self {
            player,
            subscriptions: Subscriptions::new(),
        }
    }
}

impl PlayerAdapter for PlyrAdapter {
    fn name(&self) -> &'static str {
        "plyr"
    }

    fn attach_listeners(&mut self, signals: PlaybackSignals) -> Result<()> {
        for (event, signal) in [
            (MediaEvent::Play, PlaybackEvent::Play),
            (MediaEvent::Pause, PlaybackEvent::Pause),
            (MediaEvent::Ended, PlaybackEvent::Ended),
        ] {
            self.subscriptions
                .subscribe(self.player.as_ref(), event, signals.listener(signal));
        }

        debug!(listeners = self.subscriptions.len(), "Plyr listeners attached");
        Ok(())
    }

    fn detach_listeners(&mut self) {
        self.subscriptions.clear(self.player.as_ref());
    }

    fn is_playing(&self) -> Result<bool> {
        Ok(self.player.playing())
    }

    fn current_time(&self) -> Result<f64> {
        Ok(self.player.current_time())
    }

    fn duration(&self) -> Result<f64> {
        Ok(self.player.duration())
    }
}
