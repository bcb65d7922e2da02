mod error;
pub use error::ModelError;

mod item_id;
pub use item_id::ItemId;

mod record;
pub use record::Record;

mod resource_status;
pub use resource_status::ResourceStatus;

mod mutation_status;
pub use mutation_status::MutationStatus;

mod notify_kind;
pub use notify_kind::NotifyKind;

mod page_slot;
pub use page_slot::PageSlot;

mod tone;
pub use tone::Tone;

mod event;
pub use event::{ControllerEvent, EventKind};

/// Logical name of a console section owning one controller.
///
/// Used as the `section` field of every log line and event.
pub type Section = &'static str;

/// Deadline value in milliseconds.
pub type DeadlineMs = u64;
