use serde::{Deserialize, Serialize};

use super::{DeadlineMs, ItemId, Section};

/// What happened inside a list controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    // fetch lifecycle
    FetchStarted,
    FetchSucceeded,
    FetchFailed,
    FetchTimedOut,
    FetchSuperseded,
    FetchCancelled,

    // mutation lifecycle
    MutationStarted,
    MutationSucceeded,
    MutationFailed,
    MutationRejected,

    // query
    PageClamped,

    // owner
    ScopeClosed,
}

/// Lifecycle event emitted by a controller to its event sink.
///
/// Optional fields are only populated for the kinds they make sense for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerEvent {
    pub kind: EventKind,
    pub section: Section,
    pub item: Option<ItemId>,
    pub reason: Option<String>,
    pub deadline_ms: Option<DeadlineMs>,
    pub count: Option<usize>,
}

impl ControllerEvent {
    pub fn new(kind: EventKind, section: Section) -> Self {
        Self {
            kind,
            section,
            item: None,
            reason: None,
            deadline_ms: None,
            count: None,
        }
    }

    pub fn with_item(mut self, item: ItemId) -> Self {
        self.item = Some(item);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_deadline_ms(mut self, deadline_ms: DeadlineMs) -> Self {
        self.deadline_ms = Some(deadline_ms);
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}
