//! In-memory backends with simulated latency.
//!
//! Loads and writes resolve after a fixed delay; each can be told to fail so
//! error and retry paths are reachable without a real service.

use std::{
    collections::HashSet,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use vista_core::{DataSource, SourceError};
use vista_model::{AttritionAlert, Competency, FeatureFlag, Section, Survey};

const ALERTS: &str = include_str!("../../data/alerts.json");
const FLAGS: &str = include_str!("../../data/flags.json");
const SURVEYS: &str = include_str!("../../data/surveys.json");
const COMPETENCIES: &str = include_str!("../../data/competencies.json");

fn parse<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>, serde_json::Error> {
    serde_json::from_str(raw)
}

pub fn alerts() -> Result<Vec<AttritionAlert>, serde_json::Error> {
    parse(ALERTS)
}

pub fn flags() -> Result<Vec<FeatureFlag>, serde_json::Error> {
    parse(FLAGS)
}

pub fn surveys() -> Result<Vec<Survey>, serde_json::Error> {
    parse(SURVEYS)
}

pub fn competencies() -> Result<Vec<Competency>, serde_json::Error> {
    parse(COMPETENCIES)
}

/// Serves a fixed collection after `latency`.
pub struct MockSource<T> {
    name: Section,
    rows: Vec<T>,
    latency: Duration,
    failures: AtomicUsize,
    calls: AtomicUsize,
}

impl<T: Clone> MockSource<T> {
    pub fn new(name: Section, rows: Vec<T>, latency: Duration) -> Self {
        Self {
            name,
            rows,
            latency,
            failures: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make the next `n` loads fail.
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> bool {
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl<T> DataSource<T> for MockSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn fetch(&self) -> Result<Vec<T>, SourceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(
            section = self.name,
            call,
            latency_ms = u64::try_from(self.latency.as_millis()).unwrap_or(u64::MAX),
            "mock load"
        );
        tokio::time::sleep(self.latency).await;

        if self.take_failure() {
            debug!(section = self.name, call, "mock load failing on request");
            return Err(SourceError::Unavailable(format!("{} service", self.name)));
        }
        Ok(self.rows.clone())
    }
}

/// Accepts writes after `latency`, rejecting them for sections marked failing.
pub struct MockBackend {
    latency: Duration,
    failing: Mutex<HashSet<Section>>,
}

impl MockBackend {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            failing: Mutex::new(HashSet::new()),
        }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn fail_writes(&self, section: Section, failing: bool) {
        let mut set = self.failing.lock().unwrap_or_else(PoisonError::into_inner);
        if failing {
            set.insert(section);
        } else {
            set.remove(section);
        }
    }

    fn is_failing(&self, section: Section) -> bool {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(section)
    }

    pub async fn persist(&self, section: Section) -> Result<(), SourceError> {
        tokio::time::sleep(self.latency).await;
        if self.is_failing(section) {
            return Err(SourceError::Rejected(format!("{section} write refused")));
        }
        trace!(section, "mock write accepted");
        Ok(())
    }
}
