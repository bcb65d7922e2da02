//! The analytics page: four sections under one cancellation scope.

use std::{sync::Arc, time::Instant};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vista_core::{CapabilityCheck, EventSink, NotificationCenter};
use vista_model::{AttritionAlert, Competency, FeatureFlag, Survey, Tone};

use crate::{
    config::ConsoleConfig,
    error::ConsoleError,
    mock::{self, MockBackend, MockSource},
    render::{badge, render_notifications},
    sections::{AlertsSection, CompetenciesSection, FlagsSection, SectionContext, SurveysSection},
};

/// Mocked backends behind each section, kept for fault injection.
pub struct Sources {
    pub alerts: Arc<MockSource<AttritionAlert>>,
    pub flags: Arc<MockSource<FeatureFlag>>,
    pub surveys: Arc<MockSource<Survey>>,
    pub competencies: Arc<MockSource<Competency>>,
    pub backend: Arc<MockBackend>,
}

impl Sources {
    pub fn from_fixtures(cfg: &ConsoleConfig) -> Result<Self, ConsoleError> {
        Ok(Self {
            alerts: Arc::new(MockSource::new("alerts", mock::alerts()?, cfg.latency)),
            flags: Arc::new(MockSource::new("flags", mock::flags()?, cfg.latency)),
            surveys: Arc::new(MockSource::new("surveys", mock::surveys()?, cfg.latency)),
            competencies: Arc::new(MockSource::new(
                "competencies",
                mock::competencies()?,
                cfg.latency,
            )),
            backend: Arc::new(MockBackend::new(cfg.latency)),
        })
    }
}

pub struct Console {
    scope: CancellationToken,
    notes: Arc<NotificationCenter>,
    critical: watch::Receiver<usize>,
    alerts: AlertsSection,
    flags: FlagsSection,
    surveys: SurveysSection,
    competencies: CompetenciesSection,
}

impl Console {
    pub fn new(
        cfg: &ConsoleConfig,
        sources: &Sources,
        events: Arc<dyn EventSink>,
        capabilities: Arc<dyn CapabilityCheck>,
    ) -> Self {
        let scope = CancellationToken::new();
        let notes = Arc::new(NotificationCenter::new(cfg.notifications.clone()));
        let ctx = SectionContext {
            config: cfg.controller,
            notifier: notes.clone(),
            events,
            capabilities,
            backend: Arc::clone(&sources.backend),
            scope: scope.clone(),
        };
        let (critical_tx, critical) = watch::channel(0);

        let alerts = AlertsSection::new(&ctx, sources.alerts.clone(), critical_tx);
        if cfg.alert_risk.is_some() || cfg.alert_status.is_some() {
            debug!(risk = ?cfg.alert_risk, status = ?cfg.alert_status, "initial alert filters");
            alerts.filter_risk(cfg.alert_risk);
            alerts.filter_status(cfg.alert_status);
        }

        Self {
            alerts,
            flags: FlagsSection::new(&ctx, sources.flags.clone()),
            surveys: SurveysSection::new(&ctx, sources.surveys.clone()),
            competencies: CompetenciesSection::new(&ctx, sources.competencies.clone()),
            scope,
            notes,
            critical,
        }
    }

    pub fn alerts(&self) -> &AlertsSection {
        &self.alerts
    }

    pub fn flags(&self) -> &FlagsSection {
        &self.flags
    }

    pub fn surveys(&self) -> &SurveysSection {
        &self.surveys
    }

    pub fn competencies(&self) -> &CompetenciesSection {
        &self.competencies
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notes
    }

    /// Open critical alerts, as last pushed by the alerts section.
    pub fn critical_alerts(&self) -> usize {
        *self.critical.borrow()
    }

    pub fn watch_critical(&self) -> watch::Receiver<usize> {
        self.critical.clone()
    }

    /// Load every section concurrently and wait until all have settled.
    pub async fn load_all(&self) {
        info!("loading all sections");
        tokio::join!(
            self.alerts.load().wait(),
            self.flags.load().wait(),
            self.surveys.load().wait(),
            self.competencies.load().wait(),
        );
        debug!(critical = self.critical_alerts(), "sections settled");
    }

    pub fn render(&self, color: bool) -> Vec<String> {
        let critical = self.critical_alerts();
        let tone = if critical == 0 { Tone::Positive } else { Tone::Critical };
        let mut lines = vec![format!(
            "HR analytics · {}",
            badge(tone, &format!("{critical} critical alerts"), color)
        )];
        for section in [
            self.alerts.render(color),
            self.flags.render(color),
            self.surveys.render(color),
            self.competencies.render(color),
        ] {
            lines.push(String::new());
            lines.extend(section);
        }
        let now = Instant::now();
        let expired = self.notes.prune(now);
        if !expired.is_empty() {
            debug!(count = expired.len(), "expired notifications pruned");
        }
        let notes = render_notifications(&self.notes.visible_at(now), color);
        if !notes.is_empty() {
            lines.push(String::new());
            lines.extend(notes);
        }
        lines
    }

    /// Leave the page: every in-flight load and write becomes inert.
    pub fn shutdown(&self) {
        self.alerts.controller().shutdown();
        self.flags.controller().shutdown();
        self.surveys.controller().shutdown();
        self.competencies.controller().shutdown();
        self.scope.cancel();
        info!("console closed");
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use vista_core::{AllowAll, EventRecorder, ListView};
    use vista_model::{AlertStatus, EventKind, ItemId, NotifyKind, ResourceStatus, RiskLevel};

    use super::*;

    fn console(latency_ms: u64) -> (Console, Sources, Arc<EventRecorder>) {
        let cfg = ConsoleConfig {
            latency: Duration::from_millis(latency_ms),
            ..ConsoleConfig::default()
        };
        let sources = Sources::from_fixtures(&cfg).unwrap();
        let events = Arc::new(EventRecorder::new());
        let console = Console::new(&cfg, &sources, events.clone(), Arc::new(AllowAll));
        (console, sources, events)
    }

    #[tokio::test(start_paused = true)]
    async fn loads_every_section() {
        let (console, _sources, events) = console(200);
        console.load_all().await;

        assert_eq!(events.count(EventKind::FetchSucceeded), 4);
        assert_eq!(console.critical_alerts(), 3);

        let lines = console.render(false);
        assert_eq!(lines[0], "HR analytics · [!] 3 critical alerts");
        assert!(lines.iter().any(|l| l == "Feature flags (4)"));
        assert!(lines.iter().any(|l| l == "Competencies (8)"));
    }

    #[tokio::test(start_paused = true)]
    async fn one_failing_section_does_not_block_others() {
        let (console, sources, _events) = console(200);
        sources.surveys.fail_next(1);
        console.load_all().await;

        assert_eq!(console.surveys().controller().status(), ResourceStatus::Error);
        assert_eq!(console.flags().controller().status(), ResourceStatus::Ready);
        assert_eq!(console.notifications().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn load_past_deadline_is_an_error() {
        let (console, _sources, events) = console(9_000);
        console.load_all().await;

        assert_eq!(events.count(EventKind::FetchTimedOut), 4);
        // Identical timeout messages collapse into one notification.
        assert_eq!(console.notifications().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_discards_pending_loads() {
        let (console, _sources, events) = console(500);
        console.alerts().load();
        console.flags().load();
        tokio::time::sleep(Duration::from_millis(100)).await;
        console.shutdown();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(events.count(EventKind::FetchSucceeded), 0);
        assert_eq!(events.count(EventKind::ScopeClosed), 4);
        assert_eq!(console.alerts().controller().status(), ResourceStatus::Loading);

        let err = console
            .flags()
            .toggle(&ItemId::from("ff-digest"))
            .await
            .unwrap_err();
        assert_eq!(err, vista_core::CoreError::NotReady(ResourceStatus::Loading));
    }

    #[tokio::test(start_paused = true)]
    async fn configured_alert_filters_apply_on_first_view() {
        let cfg = ConsoleConfig {
            latency: Duration::from_millis(50),
            alert_risk: Some(RiskLevel::Critical),
            alert_status: Some(AlertStatus::Open),
            ..ConsoleConfig::default()
        };
        let sources = Sources::from_fixtures(&cfg).unwrap();
        let console = Console::new(&cfg, &sources, Arc::new(EventRecorder::new()), Arc::new(AllowAll));
        console.load_all().await;

        let ListView::Ready(page) = console.alerts().controller().view() else {
            panic!("expected ready view");
        };
        assert_eq!(page.total, 3);
        assert!(page.items.iter().all(|a| a.needs_attention()));
    }

    #[tokio::test(start_paused = true)]
    async fn render_drops_expired_notifications() {
        let (console, _sources, _events) = console(50);
        console.load_all().await;
        let Some(long_ago) = Instant::now().checked_sub(Duration::from_secs(60)) else {
            return;
        };
        console
            .notifications()
            .push_at(NotifyKind::Success, "Flag saved", long_ago);
        console
            .notifications()
            .push(NotifyKind::Error, "Survey could not be closed");

        let lines = console.render(false);
        assert!(!lines.iter().any(|l| l.contains("Flag saved")));
        assert!(lines.iter().any(|l| l.contains("Survey could not be closed")));
        assert_eq!(console.notifications().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn writes_after_load_update_the_banner() {
        let (console, _sources, _events) = console(50);
        console.load_all().await;
        let mut rx = console.watch_critical();

        console
            .alerts()
            .register_action(&ItemId::from("al-001"), "Retention plan")
            .await
            .unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 2);
    }
}
