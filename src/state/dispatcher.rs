//! Event dispatcher for pub-sub notification of grid changes

use crate::state::events::GridEvent;
use tracing::{debug, info};

const MAX_EVENT_HISTORY: usize = 100;

/// Trait for components that observe grid events
pub trait GridSubscriber {
    /// Handle an event
    fn on_grid_event(&mut self, event: &GridEvent);

    /// Get subscriber name for debugging
    fn name(&self) -> &str;
}

/// Adapter so plain closures can subscribe
struct FnSubscriber<F> {
    name: String,
    handler: F,
}

impl<F> GridSubscriber for FnSubscriber<F>
where
    F: FnMut(&GridEvent),
{
    fn on_grid_event(&mut self, event: &GridEvent) {
        (self.handler)(event)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Fans grid events out to subscribers and keeps a short history
pub struct EventBus {
    subscribers: Vec<Box<dyn GridSubscriber>>,

    /// Event history for debugging
    event_history: Vec<GridEvent>,

    max_history: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            event_history: Vec::new(),
            max_history: MAX_EVENT_HISTORY,
        }
    }

    /// Add a subscriber
    pub fn subscribe(&mut self, subscriber: Box<dyn GridSubscriber>) {
        info!(target: "grid", "EventBus: Adding subscriber: {}", subscriber.name());
        self.subscribers.push(subscriber);
    }

    /// Subscribe a closure
    pub fn subscribe_fn<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: FnMut(&GridEvent) + 'static,
    {
        self.subscribe(Box::new(FnSubscriber {
            name: name.into(),
            handler,
        }));
    }

    /// Publish an event to every subscriber
    pub fn dispatch(&mut self, event: GridEvent) {
        debug!(target: "grid", "EventBus: Dispatching {}", event.kind());

        for subscriber in &mut self.subscribers {
            subscriber.on_grid_event(&event);
        }

        self.event_history.push(event);
        if self.event_history.len() > self.max_history {
            self.event_history.remove(0);
        }
    }

    /// Get event history for debugging
    pub fn history(&self) -> &[GridEvent] {
        &self.event_history
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
