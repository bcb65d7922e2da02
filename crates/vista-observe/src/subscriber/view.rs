use std::borrow::Borrow;

use tracing::{debug, info, trace, warn};
use vista_model::{ControllerEvent, EventKind};

pub trait View {
    fn as_section(&self) -> &str;
    fn as_item(&self) -> &str;
    fn as_reason(&self) -> &str;
    fn deadline_ms(&self) -> u64;
    fn count(&self) -> usize;
    fn kind(&self) -> EventKind;
}

impl<T> View for T
where
    T: Borrow<ControllerEvent>,
{
    #[inline]
    fn as_section(&self) -> &str {
        self.borrow().section
    }
    #[inline]
    fn as_item(&self) -> &str {
        self.borrow().item.as_ref().map_or("-", |id| id.as_str())
    }
    #[inline]
    fn as_reason(&self) -> &str {
        self.borrow().reason.as_deref().unwrap_or("unknown")
    }
    #[inline]
    fn deadline_ms(&self) -> u64 {
        self.borrow().deadline_ms.unwrap_or(0)
    }
    #[inline]
    fn count(&self) -> usize {
        self.borrow().count.unwrap_or(0)
    }
    #[inline]
    fn kind(&self) -> EventKind {
        self.borrow().kind
    }
}

#[inline]
pub fn message_for(kind: EventKind) -> &'static str {
    match kind {
        // fetch
        EventKind::FetchStarted => "section load started",
        EventKind::FetchSucceeded => "section loaded",
        EventKind::FetchFailed => "section load failed",
        EventKind::FetchTimedOut => "section load exceeded its deadline",
        EventKind::FetchSuperseded => "in-flight load superseded by a newer one",
        EventKind::FetchCancelled => "in-flight load cancelled",

        // mutation
        EventKind::MutationStarted => "write started",
        EventKind::MutationSucceeded => "write persisted",
        EventKind::MutationFailed => "write failed",
        EventKind::MutationRejected => "write rejected before persisting",

        // query
        EventKind::PageClamped => "page clamped to the filtered result",

        // lifecycle
        EventKind::ScopeClosed => "controller scope closed",
    }
}

#[inline]
pub fn log_event<E: View>(e: E) {
    let msg = message_for(e.kind());

    match e.kind() {
        // fetch
        EventKind::FetchStarted => {
            debug!(section = e.as_section(), deadline_ms = e.deadline_ms(), "{msg}")
        }
        EventKind::FetchSucceeded => info!(section = e.as_section(), count = e.count(), "{msg}"),
        EventKind::FetchFailed => warn!(section = e.as_section(), reason = e.as_reason(), "{msg}"),
        EventKind::FetchTimedOut => warn!(section = e.as_section(), reason = e.as_reason(), "{msg}"),
        EventKind::FetchSuperseded | EventKind::FetchCancelled => {
            trace!(section = e.as_section(), "{msg}")
        }

        // mutation
        EventKind::MutationStarted => {
            debug!(section = e.as_section(), item = e.as_item(), action = e.as_reason(), "{msg}")
        }
        EventKind::MutationSucceeded => info!(section = e.as_section(), item = e.as_item(), "{msg}"),
        EventKind::MutationFailed => warn!(
            section = e.as_section(),
            item = e.as_item(),
            reason = e.as_reason(),
            "{msg}"
        ),
        EventKind::MutationRejected => debug!(
            section = e.as_section(),
            item = e.as_item(),
            reason = e.as_reason(),
            "{msg}"
        ),

        // query
        EventKind::PageClamped => {
            trace!(section = e.as_section(), filtered = e.count(), reason = e.as_reason(), "{msg}")
        }

        // lifecycle
        EventKind::ScopeClosed => debug!(section = e.as_section(), "{msg}"),
    }
}

#[cfg(test)]
mod tests {
    use vista_model::ItemId;

    use super::*;

    #[test]
    fn view_defaults_missing_fields() {
        let e = ControllerEvent::new(EventKind::FetchStarted, "alerts");
        assert_eq!(e.as_section(), "alerts");
        assert_eq!(e.as_item(), "-");
        assert_eq!(e.as_reason(), "unknown");
        assert_eq!(e.deadline_ms(), 0);
        assert_eq!(e.count(), 0);
    }

    #[test]
    fn view_reads_populated_fields() {
        let e = ControllerEvent::new(EventKind::MutationFailed, "flags")
            .with_item(ItemId::from("f1"))
            .with_reason("timeout")
            .with_count(3);
        assert_eq!((&e).as_item(), "f1");
        assert_eq!(e.as_reason(), "timeout");
        assert_eq!(e.count(), 3);
    }

    #[test]
    fn every_kind_has_a_message() {
        for kind in [
            EventKind::FetchStarted,
            EventKind::FetchSucceeded,
            EventKind::FetchFailed,
            EventKind::FetchTimedOut,
            EventKind::FetchSuperseded,
            EventKind::FetchCancelled,
            EventKind::MutationStarted,
            EventKind::MutationSucceeded,
            EventKind::MutationFailed,
            EventKind::MutationRejected,
            EventKind::PageClamped,
            EventKind::ScopeClosed,
        ] {
            assert!(!message_for(kind).is_empty());
            log_event(ControllerEvent::new(kind, "test"));
        }
    }
}
