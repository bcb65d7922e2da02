use std::sync::Mutex;

use vista_model::{ControllerEvent, EventKind};

use crate::fetch::lock;

/// Receives controller lifecycle events.
///
/// Called synchronously on the controller's task; implementations must not block.
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: &ControllerEvent);

    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl EventSink for NoopEvents {
    fn on_event(&self, _event: &ControllerEvent) {}

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// Keeps every event in memory, oldest first.
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Mutex<Vec<ControllerEvent>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ControllerEvent> {
        lock(&self.events).clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        lock(&self.events).iter().map(|e| e.kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        lock(&self.events).iter().filter(|e| e.kind == kind).count()
    }
}

impl EventSink for EventRecorder {
    fn on_event(&self, event: &ControllerEvent) {
        lock(&self.events).push(event.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}
