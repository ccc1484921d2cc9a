//! Player surfaces
//!
//! Each trait describes the slice of a player library's API the adapters
//! consume: subscribe / unsubscribe by event name and read a few playback
//! properties. Hosts implement them over their concrete player binding.

mod registry;
#[cfg(feature = "simulated")]
pub mod simulated;

pub use registry::ListenerRegistry;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Callback invoked when a subscribed event fires
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by a subscription, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

/// HTML media element events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaEvent {
    Play,
    Pause,
    Ended,
    LoadedMetadata,
}

impl MediaEvent {
    /// DOM event name
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaEvent::Play => "play",
            MediaEvent::Pause => "pause",
            MediaEvent::Ended => "ended",
            MediaEvent::LoadedMetadata => "loadedmetadata",
        }
    }
}

/// hls.js instance events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HlsEvent {
    MediaAttached,
    ManifestParsed,
    LevelLoaded,
}

impl HlsEvent {
    /// Value of the matching `Hls.Events` constant
    pub fn as_str(&self) -> &'static str {
        match self {
            HlsEvent::MediaAttached => "hlsMediaAttached",
            HlsEvent::ManifestParsed => "hlsManifestParsed",
            HlsEvent::LevelLoaded => "hlsLevelLoaded",
        }
    }
}

/// Subscribe / unsubscribe by event
pub trait EventEmitter<E>: Send + Sync {
    fn on(&self, event: E, listener: Listener) -> ListenerId;
    fn off(&self, event: E, id: ListenerId);
}

/// An HTML media element (`<video>` / `<audio>`)
pub trait MediaElement: EventEmitter<MediaEvent> {
    fn paused(&self) -> bool;
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
}

/// A video.js player
pub trait VideoJsPlayer: EventEmitter<MediaEvent> {
    fn paused(&self) -> bool;
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
}

/// A Plyr player
pub trait PlyrPlayer: EventEmitter<MediaEvent> {
    fn playing(&self) -> bool;
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
}

/// An hls.js instance
pub trait HlsPlayer: EventEmitter<HlsEvent> {
    /// Media element the instance is attached to, if any
    fn media(&self) -> Option<Arc<dyn MediaElement>>;
}

/// A Shaka Player instance
///
/// The media element is exposed asynchronously and may not exist yet when
/// listeners are attached.
pub trait ShakaPlayer: Send + Sync {
    fn media_element(&self) -> Option<Arc<dyn MediaElement>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(MediaEvent::LoadedMetadata.as_str(), "loadedmetadata");
        assert_eq!(MediaEvent::Ended.as_str(), "ended");
        assert_eq!(HlsEvent::MediaAttached.as_str(), "hlsMediaAttached");
        assert_eq!(HlsEvent::LevelLoaded.as_str(), "hlsLevelLoaded");
    }
}
