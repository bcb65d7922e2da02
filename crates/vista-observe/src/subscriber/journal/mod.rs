use vista_core::EventSink;
use vista_model::ControllerEvent;

use crate::subscriber::view::log_event;

/// Writes every controller event to the installed tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct Journal;

impl Journal {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for Journal {
    fn on_event(&self, event: &ControllerEvent) {
        log_event(event);
    }

    fn name(&self) -> &'static str {
        "journal"
    }
}
