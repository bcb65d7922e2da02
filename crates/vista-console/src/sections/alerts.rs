use std::sync::Arc;

use tokio::sync::watch;
use vista_core::{
    CoreError, DataSource, FetchHandle, Filter, ListController, MutationRequest, QuerySpec,
};
use vista_model::{AlertStatus, AttritionAlert, ItemId, RiskLevel, Section};

use super::SectionContext;
use crate::{
    format::score_percentile,
    mock::MockBackend,
    render::{badge, render_view},
};

pub const SECTION: Section = "alerts";
pub const ACT: &str = "alerts.act";

/// Open alerts at critical risk.
pub fn count_critical(items: &[AttritionAlert]) -> usize {
    items.iter().filter(|a| a.needs_attention()).count()
}

pub struct AlertsSection {
    controller: ListController<AttritionAlert>,
    backend: Arc<MockBackend>,
}

impl AlertsSection {
    /// `critical` receives the number of open critical alerts after every load and write.
    pub fn new(
        ctx: &SectionContext,
        source: Arc<dyn DataSource<AttritionAlert>>,
        critical: watch::Sender<usize>,
    ) -> Self {
        let query = QuerySpec::new()
            .with_search_field(|a: &AttritionAlert| a.employee.clone())
            .with_search_field(|a: &AttritionAlert| a.department.clone())
            .with_sort(|a: &AttritionAlert, b: &AttritionAlert| b.score.total_cmp(&a.score));
        let observer = move |items: &[AttritionAlert]| {
            critical.send_replace(count_critical(items));
        };
        Self {
            controller: ctx.controller(SECTION, source, query, Some(Box::new(observer))),
            backend: Arc::clone(&ctx.backend),
        }
    }

    pub fn controller(&self) -> &ListController<AttritionAlert> {
        &self.controller
    }

    pub fn load(&self) -> FetchHandle {
        self.controller.load()
    }

    pub fn filter_risk(&self, risk: Option<RiskLevel>) {
        self.controller
            .update_query(|q| q.with_filter("risk", Filter::eq_by(risk, |a: &AttritionAlert| a.risk())));
    }

    pub fn filter_status(&self, status: Option<AlertStatus>) {
        self.controller
            .update_query(|q| q.with_filter("status", Filter::eq_by(status, |a: &AttritionAlert| a.status)));
    }

    pub fn search(&self, term: &str) {
        self.controller.update_query(|q| q.with_search(term));
    }

    pub fn go_to(&self, page: usize) {
        self.controller.update_query(|q| q.with_page(page));
    }

    pub fn can_act(&self, subject: &str) -> bool {
        self.controller.can_mutate(subject, ACT)
    }

    /// Record the action taken on an alert and move it to in-progress.
    pub async fn register_action(
        &self,
        id: &ItemId,
        action: &str,
    ) -> Result<AttritionAlert, CoreError> {
        let action = action.trim().to_string();
        let request = MutationRequest::new(id.clone(), "Register action", move |a: &AttritionAlert| {
            AttritionAlert {
                status: match a.status {
                    AlertStatus::Resolved => AlertStatus::Resolved,
                    AlertStatus::Open | AlertStatus::InProgress => AlertStatus::InProgress,
                },
                action: Some(action.clone()),
                ..a.clone()
            }
        })
        .with_check(|a: &AttritionAlert| {
            if a.action.as_deref().is_none_or(str::is_empty) {
                return Err(CoreError::validation("action", "Describe the action taken"));
            }
            if a.status == AlertStatus::Resolved {
                return Err(CoreError::validation("status", "This alert is already resolved"));
            }
            Ok(())
        });

        self.controller
            .dispatch(request, |_| self.backend.persist(SECTION))
            .await
    }

    pub fn render(&self, color: bool) -> Vec<String> {
        render_view("Attrition alerts", &self.controller.view(), |a| {
            let risk = a.risk();
            format!(
                "{} {} · {} · {} percentile · {}",
                badge(risk.tone(), risk.label(), color),
                a.employee,
                a.department,
                score_percentile(a.score),
                badge(a.status.tone(), a.status.label(), color),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use vista_core::{CoreError, ListView};
    use vista_model::NotifyKind;

    use super::*;
    use crate::{
        mock::{MockSource, alerts},
        sections::testing::fixture,
    };

    fn section(critical: watch::Sender<usize>) -> (AlertsSection, crate::sections::testing::Fixture) {
        let fx = fixture();
        let source = Arc::new(MockSource::new(SECTION, alerts().unwrap(), Duration::from_millis(100)));
        (AlertsSection::new(&fx.ctx, source, critical), fx)
    }

    #[tokio::test(start_paused = true)]
    async fn critical_count_is_pushed_upward() {
        let (tx, rx) = watch::channel(0);
        let (alerts, _fx) = section(tx);

        alerts.load().wait().await;
        // al-001, al-006 and al-009 are open and critical.
        assert_eq!(*rx.borrow(), 3);

        alerts
            .register_action(&ItemId::from("al-006"), "Counter-offer prepared")
            .await
            .unwrap();
        assert_eq!(*rx.borrow(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn sorted_by_score_and_paginated() {
        let (tx, _rx) = watch::channel(0);
        let (alerts, _fx) = section(tx);
        alerts.load().wait().await;

        let ListView::Ready(page) = alerts.controller().view() else {
            panic!("expected ready view");
        };
        assert_eq!(page.total, 12);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items[0].id.as_str(), "al-006");
    }

    #[tokio::test(start_paused = true)]
    async fn filters_compose_with_search() {
        let (tx, _rx) = watch::channel(0);
        let (alerts, _fx) = section(tx);
        alerts.load().wait().await;

        alerts.filter_status(Some(AlertStatus::Open));
        alerts.search("engineering");
        let ListView::Ready(page) = alerts.controller().view() else {
            panic!("expected ready view");
        };
        let ids: Vec<&str> = page.items.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["al-009", "al-002"]);

        alerts.filter_risk(Some(RiskLevel::Low));
        assert_eq!(alerts.controller().view(), ListView::Empty { filtered_out: true });

        alerts.filter_risk(None);
        alerts.filter_status(None);
        alerts.search("");
        let ListView::Ready(page) = alerts.controller().view() else {
            panic!("expected ready view");
        };
        assert_eq!(page.total, 12);
    }

    #[tokio::test(start_paused = true)]
    async fn page_is_clamped_when_filter_shrinks_result() {
        let (tx, _rx) = watch::channel(0);
        let (alerts, _fx) = section(tx);
        alerts.load().wait().await;

        alerts.go_to(3);
        alerts.filter_status(Some(AlertStatus::Resolved));
        assert_eq!(alerts.controller().query().page(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn register_action_validates_inline() {
        let (tx, _rx) = watch::channel(0);
        let (alerts, fx) = section(tx);
        alerts.load().wait().await;

        let err = alerts
            .register_action(&ItemId::from("al-001"), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { field: "action", .. }));

        let err = alerts
            .register_action(&ItemId::from("al-003"), "Follow up")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { field: "status", .. }));
        assert!(fx.notes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_write_keeps_alert_open() {
        let (tx, _rx) = watch::channel(0);
        let (alerts, fx) = section(tx);
        alerts.load().wait().await;
        fx.ctx.backend.fail_writes(SECTION, true);

        let err = alerts
            .register_action(&ItemId::from("al-001"), "Stay interview")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Operation(_)));

        let items = alerts.controller().items().unwrap();
        let alert = items.iter().find(|a| a.id.as_str() == "al-001").unwrap();
        assert_eq!(alert.status, AlertStatus::Open);
        assert_eq!(fx.notes.visible()[0].kind, NotifyKind::Error);
    }
}
