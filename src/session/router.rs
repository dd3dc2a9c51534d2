//! Session Event Router
//!
//! Explicit subscriber registry. Steps register a listener when they start
//! and deregister it when they shut down; the host pushes events in through
//! [`SessionEventRouter::publish`].

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use super::events::{SessionEvent, VariableChanged, WidgetLoaded};

/// Receiver side of session notifications
pub trait SessionListener: Send + Sync {
    fn on_variable_changed(&self, event: &VariableChanged);
    fn on_widget_loaded(&self, event: &WidgetLoaded);
}

/// Token returned by [`SessionEventRouter::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fans session events out to every registered listener
#[derive(Default)]
pub struct SessionEventRouter {
    listeners: DashMap<SubscriptionId, Arc<dyn SessionListener>>,
}

impl SessionEventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it receives every event published afterwards
    pub fn subscribe(&self, listener: Arc<dyn SessionListener>) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.listeners.insert(id, listener);
        debug!("Registered session listener {}", id);
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.listeners.remove(&id).is_some();
        if removed {
            debug!("Removed session listener {}", id);
        }
        removed
    }

    /// Deliver an event to all current listeners
    ///
    /// Listeners are snapshotted first so a listener may subscribe or
    /// unsubscribe while handling the event.
    pub fn publish(&self, event: &SessionEvent) {
        if !event.is_well_formed() {
            debug!("Ignoring malformed {} event: {:?}", event.event_type(), event);
            return;
        }

        let listeners: Vec<Arc<dyn SessionListener>> = self
            .listeners
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        for listener in listeners {
            match event {
                SessionEvent::VariableChanged(e) => listener.on_variable_changed(e),
                SessionEvent::WidgetLoaded(e) => listener.on_widget_loaded(e),
            }
        }
    }

    pub fn publish_variable_changed(&self, event: VariableChanged) {
        self.publish(&SessionEvent::VariableChanged(event));
    }

    pub fn publish_widget_loaded(&self, event: WidgetLoaded) {
        self.publish(&SessionEvent::WidgetLoaded(event));
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<SessionEvent>>,
    }

    impl SessionListener for Recorder {
        fn on_variable_changed(&self, event: &VariableChanged) {
            self.seen.lock().unwrap().push((*event).into());
        }

        fn on_widget_loaded(&self, event: &WidgetLoaded) {
            self.seen.lock().unwrap().push((*event).into());
        }
    }

    #[test]
    fn test_subscribe_and_publish() {
        let router = SessionEventRouter::new();
        let recorder = Arc::new(Recorder::default());
        router.subscribe(recorder.clone());

        router.publish_variable_changed(VariableChanged { variable_id: 542, new_value: 1 });
        router.publish_widget_loaded(WidgetLoaded { group_id: 219 });

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], SessionEvent::WidgetLoaded(WidgetLoaded { group_id: 219 }));
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let router = SessionEventRouter::new();
        let recorder = Arc::new(Recorder::default());
        let id = router.subscribe(recorder.clone());

        assert!(router.unsubscribe(id));
        assert!(!router.unsubscribe(id));
        assert!(router.is_empty());

        router.publish_widget_loaded(WidgetLoaded { group_id: 219 });
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_events_dropped() {
        let router = SessionEventRouter::new();
        let recorder = Arc::new(Recorder::default());
        router.subscribe(recorder.clone());

        router.publish_widget_loaded(WidgetLoaded { group_id: -1 });
        router.publish_variable_changed(VariableChanged { variable_id: -3, new_value: 0 });

        assert!(recorder.seen.lock().unwrap().is_empty());
    }
}
