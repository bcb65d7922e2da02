//! Transient user-facing notifications.
//!
//! Sinks are fire-and-forget: callers never wait for delivery and get no
//! acknowledgement. [`NotificationCenter`] keeps a bounded queue with per-kind
//! time-to-live, a visible window and duplicate suppression; [`LogSink`] only
//! writes to the log.

use std::{
    collections::VecDeque,
    sync::Mutex,
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};
use uuid::Uuid;
use vista_model::NotifyKind;

use crate::fetch::lock;

pub trait NotificationSink: Send + Sync {
    fn notify(&self, kind: NotifyKind, text: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotifyKind,
    pub text: String,
    pub ttl: Duration,
    pub created_at: Instant,
}

impl Notification {
    pub fn expires_at(&self) -> Instant {
        self.created_at + self.ttl
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at()
    }
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// Maximum number of notifications shown at once.
    pub max_visible: usize,
    /// Maximum number kept; the oldest is dropped beyond this.
    pub max_queued: usize,
    pub success_ttl: Duration,
    pub error_ttl: Duration,
    pub info_ttl: Duration,
    /// Identical kind and text within this window are shown once.
    pub dedup_window: Duration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_visible: 3,
            max_queued: 10,
            success_ttl: Duration::from_secs(3),
            error_ttl: Duration::from_secs(5),
            info_ttl: Duration::from_secs(4),
            dedup_window: Duration::from_secs(1),
        }
    }
}

impl NotificationConfig {
    pub fn max_visible(mut self, max: usize) -> Self {
        self.max_visible = max;
        self
    }

    pub fn max_queued(mut self, max: usize) -> Self {
        self.max_queued = max.max(1);
        self
    }

    pub fn dedup_window(mut self, window: Duration) -> Self {
        self.dedup_window = window;
        self
    }

    pub fn ttl_for(&self, kind: NotifyKind) -> Duration {
        match kind {
            NotifyKind::Success => self.success_ttl,
            NotifyKind::Error => self.error_ttl,
            NotifyKind::Info => self.info_ttl,
        }
    }
}

/// Bounded, auto-expiring notification queue.
pub struct NotificationCenter {
    config: NotificationConfig,
    queue: Mutex<VecDeque<Notification>>,
}

impl NotificationCenter {
    pub fn new(config: NotificationConfig) -> Self {
        Self {
            config,
            queue: Mutex::new(VecDeque::new()),
        }
    }

    pub fn config(&self) -> &NotificationConfig {
        &self.config
    }

    /// Queue a notification created now. Returns `None` when suppressed as a duplicate.
    pub fn push(&self, kind: NotifyKind, text: impl Into<String>) -> Option<Uuid> {
        self.push_at(kind, text, Instant::now())
    }

    pub fn push_at(&self, kind: NotifyKind, text: impl Into<String>, now: Instant) -> Option<Uuid> {
        let text = text.into();
        let mut queue = lock(&self.queue);

        let duplicate = queue.iter().any(|n| {
            n.kind == kind
                && n.text == text
                && now.saturating_duration_since(n.created_at) < self.config.dedup_window
        });
        if duplicate {
            debug!(%kind, "duplicate notification suppressed");
            return None;
        }

        let id = Uuid::new_v4();
        queue.push_back(Notification {
            id,
            kind,
            text,
            ttl: self.config.ttl_for(kind),
            created_at: now,
        });
        while queue.len() > self.config.max_queued.max(1) {
            if let Some(dropped) = queue.pop_front() {
                debug!(id = %dropped.id, "notification queue full; oldest dropped");
            }
        }
        Some(id)
    }

    /// Manually dismiss one notification.
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut queue = lock(&self.queue);
        let before = queue.len();
        queue.retain(|n| n.id != id);
        queue.len() != before
    }

    /// Remove and return every notification expired at `now`.
    pub fn prune(&self, now: Instant) -> Vec<Notification> {
        let mut queue = lock(&self.queue);
        let (expired, alive): (Vec<_>, Vec<_>) = queue.drain(..).partition(|n| n.is_expired(now));
        queue.extend(alive);
        expired
    }

    /// Oldest-first notifications currently on screen.
    pub fn visible(&self) -> Vec<Notification> {
        self.visible_at(Instant::now())
    }

    /// Notifications on screen at `now`. Expired ones are never shown,
    /// whether or not they have been pruned yet.
    pub fn visible_at(&self, now: Instant) -> Vec<Notification> {
        lock(&self.queue)
            .iter()
            .filter(|n| !n.is_expired(now))
            .take(self.config.max_visible)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.queue).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.queue).is_empty()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(NotificationConfig::default())
    }
}

impl NotificationSink for NotificationCenter {
    fn notify(&self, kind: NotifyKind, text: &str) {
        self.push(kind, text);
    }
}

/// Sink that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, kind: NotifyKind, text: &str) {
        match kind {
            NotifyKind::Error => warn!(target: "vista::notify", %kind, "{text}"),
            NotifyKind::Success | NotifyKind::Info => info!(target: "vista::notify", %kind, "{text}"),
        }
    }
}
