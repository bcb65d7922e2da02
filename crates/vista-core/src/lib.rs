pub mod access;
pub use access::{AllowAll, CapabilityCheck, PermissionSet};
pub mod controller;
pub use controller::{ControllerConfig, ListController, ListControllerBuilder, ListView};
pub mod error;
pub use error::CoreError;
pub mod event;
pub use event::{EventRecorder, EventSink, NoopEvents};
pub mod fetch;
pub use fetch::{FetchGuard, FetchHandle, with_deadline};
pub mod mutation;
pub use mutation::{MutationDispatcher, MutationOutcome, MutationRequest};
pub mod notify;
pub use notify::{LogSink, Notification, NotificationCenter, NotificationConfig, NotificationSink};
pub mod query;
pub use query::{Filter, QueryResult, QuerySpec};
pub mod source;
pub use source::{DataSource, FnSource, SourceError};
pub mod state;
pub use state::{Resource, ResourceState};
pub mod window;
pub use window::compute_window;

pub use vista_model::Record;
