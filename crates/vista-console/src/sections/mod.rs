//! HR console sections. Each wraps one [`ListController`] and adds its domain actions.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use vista_core::{
    CapabilityCheck, ControllerConfig, DataSource, EventSink, ListController, NotificationSink,
    QuerySpec, Record,
};
use vista_model::Section;

use crate::mock::MockBackend;

pub mod alerts;
pub use alerts::{AlertsSection, count_critical};

pub mod competencies;
pub use competencies::CompetenciesSection;

pub mod flags;
pub use flags::FlagsSection;

pub mod surveys;
pub use surveys::SurveysSection;

/// Collaborators shared by every section of one console page.
#[derive(Clone)]
pub struct SectionContext {
    pub config: ControllerConfig,
    pub notifier: Arc<dyn NotificationSink>,
    pub events: Arc<dyn EventSink>,
    pub capabilities: Arc<dyn CapabilityCheck>,
    pub backend: Arc<MockBackend>,
    /// Page scope; cancelling it stops every section at once.
    pub scope: CancellationToken,
}

impl SectionContext {
    fn controller<T: Record>(
        &self,
        name: Section,
        source: Arc<dyn DataSource<T>>,
        query: QuerySpec<T>,
        observer: Option<Box<dyn Fn(&[T]) + Send + Sync>>,
    ) -> ListController<T> {
        let mut builder = ListController::builder(name, source)
            .config(self.config)
            .query(query.with_page_size(self.config.page_size))
            .notifier(Arc::clone(&self.notifier))
            .events(Arc::clone(&self.events))
            .capabilities(Arc::clone(&self.capabilities))
            .scope(&self.scope);
        if let Some(observer) = observer {
            builder = builder.observer(observer);
        }
        builder.build()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::time::Duration;

    use vista_core::{AllowAll, EventRecorder, NotificationCenter};

    use super::*;

    pub(crate) struct Fixture {
        pub ctx: SectionContext,
        pub notes: Arc<NotificationCenter>,
        pub events: Arc<EventRecorder>,
    }

    pub(crate) fn fixture() -> Fixture {
        let notes = Arc::new(NotificationCenter::default());
        let events = Arc::new(EventRecorder::new());
        let ctx = SectionContext {
            config: ControllerConfig::default()
                .with_load_deadline(Duration::from_millis(500))
                .with_mutation_deadline(Duration::from_millis(300))
                .with_page_size(5),
            notifier: notes.clone(),
            events: events.clone(),
            capabilities: Arc::new(AllowAll),
            backend: Arc::new(MockBackend::new(Duration::from_millis(50))),
            scope: CancellationToken::new(),
        };
        Fixture { ctx, notes, events }
    }
}
