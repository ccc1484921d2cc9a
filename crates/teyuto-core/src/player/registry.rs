//! Listener bookkeeping for player bindings

use super::{Listener, ListenerId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Listeners keyed by event, in subscription order
pub struct ListenerRegistry<E> {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(E, ListenerId, Listener)>>,
}

impl<E: Copy + PartialEq> ListenerRegistry<E> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn add(&self, event: E, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((event, id, listener));
        id
    }

    /// Remove a listener; unknown ids are ignored
    pub fn remove(&self, event: E, id: ListenerId) {
        self.listeners
            .lock()
            .retain(|(e, lid, _)| !(*e == event && *lid == id));
    }

    /// Invoke every listener registered for `event`
    ///
    /// The lock is released before listeners run, so a listener may
    /// subscribe or unsubscribe.
    pub fn emit(&self, event: E) {
        let matching: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .filter(|(e, _, _)| *e == event)
            .map(|(_, _, l)| l.clone())
            .collect();

        for listener in matching {
            listener();
        }
    }

    pub fn count(&self, event: E) -> usize {
        self.listeners.lock().iter().filter(|(e, _, _)| *e == event).count()
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }
}

impl<E: Copy + PartialEq> Default for ListenerRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::MediaEvent;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_emit_and_remove() {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        let id = registry.add(
            MediaEvent::Play,
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        registry.emit(MediaEvent::Play);
        registry.emit(MediaEvent::Pause);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // wrong event leaves the listener in place
        registry.remove(MediaEvent::Pause, id);
        assert_eq!(registry.count(MediaEvent::Play), 1);

        registry.remove(MediaEvent::Play, id);
        registry.emit(MediaEvent::Play);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = ListenerRegistry::new();
        let a = registry.add(MediaEvent::Play, Arc::new(|| {}));
        let b = registry.add(MediaEvent::Play, Arc::new(|| {}));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }
}
