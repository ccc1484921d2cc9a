//! Player adapters
//!
//! [`PlayerAdapter`] is the capability contract the reporter polls and
//! subscribes through. Every hook has a default body that fails with
//! [`Error::NotImplemented`]; a concrete adapter overrides all of them.

mod hls;
mod plyr;
mod shaka;
mod videojs;

pub use hls::HlsAdapter;
pub use plyr::PlyrAdapter;
pub use shaka::{DiscoveryStatus, ShakaAdapter, DISCOVERY_INTERVAL, MAX_DISCOVERY_ATTEMPTS};
pub use videojs::VideoJsAdapter;

use crate::{
    player::{EventEmitter, Listener, ListenerId},
    Error, PlaybackEvent, Result,
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Sender side of a session's notification queue
///
/// Adapters turn player events into [`PlaybackEvent`]s through listeners
/// built here. Sending never blocks; events sent after the session stopped
/// are dropped.
#[derive(Debug, Clone)]
pub struct PlaybackSignals {
    tx: mpsc::UnboundedSender<PlaybackEvent>,
}

impl PlaybackSignals {
    /// Create a signal sender and the matching receiver
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, event: PlaybackEvent) {
        let _ = self.tx.send(event);
    }

    /// Listener that forwards `event` when invoked
    pub fn listener(&self, event: PlaybackEvent) -> Listener {
        let signals = self.clone();
        Arc::new(move || signals.send(event))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Player-introspection capability
pub trait PlayerAdapter: Send {
    /// Player library name, for logs
    fn name(&self) -> &'static str {
        "unbound"
    }

    /// Subscribe to the player's play / pause / ended notifications,
    /// forwarding each through `signals`
    fn attach_listeners(&mut self, signals: PlaybackSignals) -> Result<()> {
        let _ = signals;
        Err(Error::NotImplemented { hook: "attach_listeners" })
    }

    /// Remove every subscription made by `attach_listeners`
    fn detach_listeners(&mut self) {}

    fn is_playing(&self) -> Result<bool> {
        Err(Error::NotImplemented { hook: "is_playing" })
    }

    fn current_time(&self) -> Result<f64> {
        Err(Error::NotImplemented { hook: "current_time" })
    }

    fn duration(&self) -> Result<f64> {
        Err(Error::NotImplemented { hook: "duration" })
    }
}

/// Subscriptions made on one emitter, removable in one go
pub(crate) struct Subscriptions<E> {
    entries: Vec<(E, ListenerId)>,
}

impl<E: Copy> Subscriptions<E> {
    pub(crate) fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub(crate) fn subscribe<T>(&mut self, emitter: &T, event: E, listener: Listener)
    where
        T: EventEmitter<E> + ?Sized,
    {
        let id = emitter.on(event, listener);
        self.entries.push((event, id));
    }

    pub(crate) fn clear<T>(&mut self, emitter: &T)
    where
        T: EventEmitter<E> + ?Sized,
    {
        for (event, id) in self.entries.drain(..) {
            emitter.off(event, id);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
