//! In-memory players
//!
//! Headless stand-ins for the browser players, used by the CLI simulation
//! and by tests. [`SimulatedMedia`] behaves like an HTML media element and
//! also serves as a video.js or Plyr player.

use super::{
    EventEmitter, HlsEvent, HlsPlayer, Listener, ListenerId, ListenerRegistry, MediaElement,
    MediaEvent, PlyrPlayer, ShakaPlayer, VideoJsPlayer,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
struct MediaState {
    paused: bool,
    current_time: f64,
    duration: f64,
}

/// Simulated media element
pub struct SimulatedMedia {
    state: Mutex<MediaState>,
    listeners: ListenerRegistry<MediaEvent>,
}

impl SimulatedMedia {
    /// Create a paused element at position 0
    pub fn new(duration: f64) -> Self {
        Self {
            state: Mutex::new(MediaState {
                paused: true,
                current_time: 0.0,
                duration,
            }),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Start playback, firing `play` if the element was paused
    pub fn play(&self) {
        let fire = {
            let mut state = self.state.lock();
            let was_paused = state.paused;
            if state.current_time >= state.duration {
                state.current_time = 0.0;
            }
            state.paused = false;
            was_paused
        };
        if fire {
            self.listeners.emit(MediaEvent::Play);
        }
    }

    /// Pause playback, firing `pause` if the element was playing
    pub fn pause(&self) {
        let fire = {
            let mut state = self.state.lock();
            let was_playing = !state.paused;
            state.paused = true;
            was_playing
        };
        if fire {
            self.listeners.emit(MediaEvent::Pause);
        }
    }

    /// Advance the playhead by `secs` while playing
    ///
    /// Reaching the duration pauses the element and fires `pause` then
    /// `ended`, in that order, like a browser does.
    pub fn advance(&self, secs: f64) {
        let reached_end = {
            let mut state = self.state.lock();
            if state.paused {
                return;
            }
            state.current_time = (state.current_time + secs).min(state.duration);
            if state.current_time >= state.duration {
                state.paused = true;
                true
            } else {
                false
            }
        };
        if reached_end {
            self.listeners.emit(MediaEvent::Pause);
            self.listeners.emit(MediaEvent::Ended);
        }
    }

    pub fn seek(&self, position: f64) {
        let mut state = self.state.lock();
        state.current_time = position.max(0.0).min(state.duration);
    }

    /// Fire `loadedmetadata`
    pub fn load_metadata(&self) {
        self.listeners.emit(MediaEvent::LoadedMetadata);
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    pub fn position(&self) -> f64 {
        self.state.lock().current_time
    }

    pub fn length(&self) -> f64 {
        self.state.lock().duration
    }

    /// Number of live subscriptions for `event`
    pub fn listener_count(&self, event: MediaEvent) -> usize {
        self.listeners.count(event)
    }

    /// Total number of live subscriptions
    pub fn total_listeners(&self) -> usize {
        self.listeners.len()
    }
}

impl EventEmitter<MediaEvent> for SimulatedMedia {
    fn on(&self, event: MediaEvent, listener: Listener) -> ListenerId {
        self.listeners.add(event, listener)
    }

    fn off(&self, event: MediaEvent, id: ListenerId) {
        self.listeners.remove(event, id);
    }
}

impl MediaElement for SimulatedMedia {
    fn paused(&self) -> bool {
        self.is_paused()
    }

    fn current_time(&self) -> f64 {
        self.position()
    }

    fn duration(&self) -> f64 {
        self.length()
    }
}

impl VideoJsPlayer for SimulatedMedia {
    fn paused(&self) -> bool {
        self.is_paused()
    }

    fn current_time(&self) -> f64 {
        self.position()
    }

    fn duration(&self) -> f64 {
        self.length()
    }
}

impl PlyrPlayer for SimulatedMedia {
    fn playing(&self) -> bool {
        !self.is_paused()
    }

    fn current_time(&self) -> f64 {
        self.position()
    }

    fn duration(&self) -> f64 {
        self.length()
    }
}

/// Simulated hls.js instance
pub struct SimulatedHls {
    media: Mutex<Option<Arc<SimulatedMedia>>>,
    listeners: ListenerRegistry<HlsEvent>,
}

impl SimulatedHls {
    /// Instance with no media attached
    pub fn new() -> Self {
        Self {
            media: Mutex::new(None),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Instance already attached to `media`
    pub fn with_media(media: Arc<SimulatedMedia>) -> Self {
        let hls = Self::new();
        *hls.media.lock() = Some(media);
        hls
    }

    /// Attach a media element, firing `hlsMediaAttached`
    pub fn attach_media(&self, media: Arc<SimulatedMedia>) {
        *self.media.lock() = Some(media);
        self.listeners.emit(HlsEvent::MediaAttached);
    }

    pub fn detach_media(&self) {
        self.media.lock().take();
    }

    /// Fire an hls.js event
    pub fn emit(&self, event: HlsEvent) {
        self.listeners.emit(event);
    }

    pub fn listener_count(&self, event: HlsEvent) -> usize {
        self.listeners.count(event)
    }
}

impl Default for SimulatedHls {
    fn default() -> Self {
        Self::new()
    }
}

impl EventEmitter<HlsEvent> for SimulatedHls {
    fn on(&self, event: HlsEvent, listener: Listener) -> ListenerId {
        self.listeners.add(event, listener)
    }

    fn off(&self, event: HlsEvent, id: ListenerId) {
        self.listeners.remove(event, id);
    }
}

impl HlsPlayer for SimulatedHls {
    fn media(&self) -> Option<Arc<dyn MediaElement>> {
        self.media
            .lock()
            .clone()
            .map(|m| m as Arc<dyn MediaElement>)
    }
}

/// Simulated Shaka Player whose media element shows up after a number of
/// lookups
pub struct SimulatedShaka {
    element: Arc<SimulatedMedia>,
    available_from: Option<u32>,
    lookups: AtomicU32,
}

impl SimulatedShaka {
    /// Element present from the first lookup
    pub fn new(element: Arc<SimulatedMedia>) -> Self {
        Self::available_from_lookup(element, 1)
    }

    /// Element absent until lookup number `lookup` (1-based)
    pub fn available_from_lookup(element: Arc<SimulatedMedia>, lookup: u32) -> Self {
        Self {
            element,
            available_from: Some(lookup),
            lookups: AtomicU32::new(0),
        }
    }

    /// Element never becomes available
    pub fn never_available(element: Arc<SimulatedMedia>) -> Self {
        Self {
            element,
            available_from: None,
            lookups: AtomicU32::new(0),
        }
    }

    /// Number of `media_element` calls so far
    pub fn lookups(&self) -> u32 {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn element(&self) -> &Arc<SimulatedMedia> {
        &self.element
    }
}

impl ShakaPlayer for SimulatedShaka {
    fn media_element(&self) -> Option<Arc<dyn MediaElement>> {
        let lookup = self.lookups.fetch_add(1, Ordering::SeqCst) + 1;
        match self.available_from {
            Some(from) if lookup >= from => Some(self.element.clone() as Arc<dyn MediaElement>),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter(media: &SimulatedMedia, event: MediaEvent) -> Arc<AtomicUsize> {
        let hits = Arc::new(AtomicUsize::new(0));
        let c = hits.clone();
        media.on(
            event,
            Arc::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );
        hits
    }

    #[test]
    fn test_play_pause_events() {
        let media = SimulatedMedia::new(60.0);
        let plays = counter(&media, MediaEvent::Play);
        let pauses = counter(&media, MediaEvent::Pause);

        media.play();
        media.play();
        assert_eq!(plays.load(Ordering::SeqCst), 1);
        assert!(!media.is_paused());

        media.pause();
        media.pause();
        assert_eq!(pauses.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_advance_to_end() {
        let media = SimulatedMedia::new(10.0);
        let pauses = counter(&media, MediaEvent::Pause);
        let ends = counter(&media, MediaEvent::Ended);

        media.advance(5.0);
        assert_eq!(media.position(), 0.0);

        media.play();
        media.advance(4.0);
        assert_eq!(media.position(), 4.0);
        media.advance(100.0);
        assert_eq!(media.position(), 10.0);
        assert!(media.is_paused());
        assert_eq!(pauses.load(Ordering::SeqCst), 1);
        assert_eq!(ends.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_shaka_lookup_schedule() {
        let shaka = SimulatedShaka::available_from_lookup(Arc::new(SimulatedMedia::new(1.0)), 3);
        assert!(shaka.media_element().is_none());
        assert!(shaka.media_element().is_none());
        assert!(shaka.media_element().is_some());
        assert_eq!(shaka.lookups(), 3);

        let never = SimulatedShaka::never_available(Arc::new(SimulatedMedia::new(1.0)));
        assert!(never.media_element().is_none());
    }

    #[test]
    fn test_hls_media() {
        let hls = SimulatedHls::new();
        assert!(hls.media().is_none());

        hls.attach_media(Arc::new(SimulatedMedia::new(30.0)));
        assert_eq!(hls.media().unwrap().duration(), 30.0);
    }
}
