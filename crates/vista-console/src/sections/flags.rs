use std::sync::Arc;

use vista_core::{CoreError, DataSource, FetchHandle, Filter, ListController, MutationRequest, QuerySpec};
use vista_model::{FeatureFlag, ItemId, Section};

use super::SectionContext;
use crate::{
    mock::MockBackend,
    render::{badge, render_view},
};

pub const SECTION: Section = "flags";
pub const TOGGLE: &str = "flags.toggle";

pub struct FlagsSection {
    controller: ListController<FeatureFlag>,
    backend: Arc<MockBackend>,
}

impl FlagsSection {
    pub fn new(ctx: &SectionContext, source: Arc<dyn DataSource<FeatureFlag>>) -> Self {
        let query = QuerySpec::new()
            .with_search_field(|f: &FeatureFlag| f.key.clone())
            .with_search_field(|f: &FeatureFlag| f.description.clone())
            .with_sort(|a: &FeatureFlag, b: &FeatureFlag| a.key.cmp(&b.key));
        Self {
            controller: ctx.controller(SECTION, source, query, None),
            backend: Arc::clone(&ctx.backend),
        }
    }

    pub fn controller(&self) -> &ListController<FeatureFlag> {
        &self.controller
    }

    pub fn load(&self) -> FetchHandle {
        self.controller.load()
    }

    pub fn filter_enabled(&self, enabled: Option<bool>) {
        self.controller
            .update_query(|q| q.with_filter("enabled", Filter::eq_by(enabled, |f: &FeatureFlag| f.enabled)));
    }

    pub fn search(&self, term: &str) {
        self.controller.update_query(|q| q.with_search(term));
    }

    pub fn can_toggle(&self, subject: &str) -> bool {
        self.controller.can_mutate(subject, TOGGLE)
    }

    /// `true` while a toggle for `id` is in flight; the switch should be disabled.
    pub fn is_toggling(&self, id: &ItemId) -> bool {
        self.controller.is_pending(id)
    }

    pub async fn toggle(&self, id: &ItemId) -> Result<FeatureFlag, CoreError> {
        let request = MutationRequest::new(id.clone(), "Toggle flag", FeatureFlag::toggled);
        self.controller
            .dispatch(request, |_| self.backend.persist(SECTION))
            .await
    }

    pub fn render(&self, color: bool) -> Vec<String> {
        render_view("Feature flags", &self.controller.view(), |f| {
            format!(
                "{} {} · {}",
                badge(f.tone(), f.label(), color),
                f.key,
                f.description
            )
        })
    }
}
