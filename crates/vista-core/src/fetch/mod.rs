//! Deadline-bounded, cancellable execution of one async data-producing operation.
//!
//! A [`FetchGuard`] owns at most one in-flight fetch. Starting a new one
//! cancels the previous (latest request wins), and a cancelled fetch never
//! invokes its settle callback, even if its operation completes afterwards.

use std::{
    fmt::Display,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use vista_model::Section;

use crate::error::CoreError;

/// Await `operation` for at most `deadline`, translating both failure paths into [`CoreError`].
pub async fn with_deadline<T, E, Fut>(operation: Fut, deadline: Duration) -> Result<T, CoreError>
where
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(CoreError::Operation(e.to_string())),
        Err(_) => Err(CoreError::Timeout {
            deadline_ms: deadline_ms(deadline),
        }),
    }
}

pub(crate) fn deadline_ms(deadline: Duration) -> u64 {
    u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX)
}

pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One started fetch. `gate` is held while its result is claimed and delivered.
#[derive(Clone)]
struct Ticket {
    id: u64,
    token: CancellationToken,
    gate: Arc<Mutex<()>>,
}

#[derive(Default)]
struct Slot {
    next_id: u64,
    active: Option<Ticket>,
}

/// Take the right to deliver a result.
///
/// Succeeds only for the active, uncancelled ticket. Runs under the slot lock,
/// so once a ticket is cancelled no later claim can succeed.
fn claim(slot: &Mutex<Slot>, id: u64, token: &CancellationToken) -> bool {
    let mut slot = lock(slot);
    if token.is_cancelled() {
        return false;
    }
    match &slot.active {
        Some(ticket) if ticket.id == id => {
            slot.active = None;
            true
        }
        _ => false,
    }
}

fn release(slot: &Mutex<Slot>, id: u64) {
    let mut slot = lock(slot);
    if matches!(&slot.active, Some(ticket) if ticket.id == id) {
        slot.active = None;
    }
}

/// Runs fetches for one owner under latest-request-wins rules.
pub struct FetchGuard {
    name: Section,
    scope: CancellationToken,
    slot: Arc<Mutex<Slot>>,
}

impl FetchGuard {
    /// Guard with its own root scope.
    pub fn new(name: Section) -> Self {
        Self::with_scope(name, &CancellationToken::new())
    }

    /// Guard whose fetches also stop when `parent` is cancelled.
    pub fn with_scope(name: Section, parent: &CancellationToken) -> Self {
        Self {
            name,
            scope: parent.child_token(),
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Start `operation` racing `deadline`.
    ///
    /// `on_settle` receives exactly one of: the value, [`CoreError::Operation`]
    /// or [`CoreError::Timeout`]; or it is never called if this fetch is
    /// cancelled or superseded first.
    ///
    /// `on_settle` runs with this fetch's delivery gate held, so it must not
    /// call [`FetchHandle::cancel`] on its own handle.
    pub fn run<T, E, Fut, F>(&self, operation: Fut, deadline: Duration, on_settle: F) -> FetchHandle
    where
        T: Send + 'static,
        E: Display + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        F: FnOnce(Result<T, CoreError>) + Send + 'static,
    {
        let ticket = {
            let mut slot = lock(&self.slot);
            if let Some(prev) = slot.active.take() {
                prev.token.cancel();
                debug!(section = self.name, fetch = prev.id, "in-flight fetch superseded");
            }
            slot.next_id += 1;
            let ticket = Ticket {
                id: slot.next_id,
                token: self.scope.child_token(),
                gate: Arc::new(Mutex::new(())),
            };
            slot.active = Some(ticket.clone());
            ticket
        };

        let name = self.name;
        let slot = Arc::clone(&self.slot);
        let Ticket { id, token, gate } = ticket.clone();
        trace!(section = name, fetch = id, deadline_ms = deadline_ms(deadline), "fetch started");

        let join = tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    release(&slot, id);
                    trace!(section = name, fetch = id, "fetch cancelled before settling");
                    return;
                }
                res = with_deadline(operation, deadline) => res,
            };

            let _delivering = lock(&gate);
            if !claim(&slot, id, &token) {
                trace!(section = name, fetch = id, "late result discarded");
                return;
            }
            on_settle(outcome);
        });

        FetchHandle {
            ticket,
            slot: Arc::clone(&self.slot),
            join,
        }
    }

    /// Cancel the fetch that has not settled yet, if any. Returns whether one was.
    ///
    /// A fetch already delivering its result is not waited for; use
    /// [`FetchHandle::cancel`] for that.
    pub fn cancel(&self) -> bool {
        let Some(ticket) = lock(&self.slot).active.take() else {
            return false;
        };
        ticket.token.cancel();
        debug!(section = self.name, fetch = ticket.id, "fetch cancelled");
        true
    }

    /// Cancel the in-flight fetch and refuse every future one.
    pub fn close(&self) {
        self.cancel();
        self.scope.cancel();
    }

    pub fn is_in_flight(&self) -> bool {
        lock(&self.slot).active.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.scope.is_cancelled()
    }
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

/// Handle to one started fetch.
///
/// Dropping the handle does not cancel the fetch.
pub struct FetchHandle {
    ticket: Ticket,
    slot: Arc<Mutex<Slot>>,
    join: JoinHandle<()>,
}

impl FetchHandle {
    pub fn id(&self) -> u64 {
        self.ticket.id
    }

    /// After this returns the settle callback of this fetch is neither running
    /// nor going to start. A callback already running is waited for.
    pub fn cancel(&self) {
        let _delivering = lock(&self.ticket.gate);
        self.ticket.token.cancel();
        release(&self.slot, self.ticket.id);
    }

    pub fn is_cancelled(&self) -> bool {
        self.ticket.token.is_cancelled()
    }

    /// Wait until the fetch task has settled or been discarded.
    ///
    /// A panic inside the settle callback is resumed here.
    pub async fn wait(self) {
        if let Err(e) = self.join.await
            && e.is_panic()
        {
            std::panic::resume_unwind(e.into_panic());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    type Log = Arc<Mutex<Vec<Result<u32, CoreError>>>>;

    fn recorder() -> (Log, impl Fn() -> Box<dyn FnOnce(Result<u32, CoreError>) + Send>) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let make = {
            let log = Arc::clone(&log);
            move || {
                let log = Arc::clone(&log);
                Box::new(move |r: Result<u32, CoreError>| log.lock().unwrap().push(r))
                    as Box<dyn FnOnce(Result<u32, CoreError>) + Send>
            }
        };
        (log, make)
    }

    async fn after(ms: u64, value: u32) -> Result<u32, String> {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(value)
    }

    async fn fail_after(ms: u64) -> Result<u32, String> {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Err("backend unavailable".to_string())
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn success_settles_once() {
        let (log, cb) = recorder();
        let guard = FetchGuard::new("test");

        let handle = guard.run(after(20, 7), ms(1000), cb());
        assert!(guard.is_in_flight());
        handle.wait().await;

        assert_eq!(*log.lock().unwrap(), vec![Ok(7)]);
        assert!(!guard.is_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_wins_over_slow_operation() {
        let (log, cb) = recorder();
        let guard = FetchGuard::new("test");

        guard.run(after(100, 1), ms(50), cb());
        tokio::time::sleep(ms(300)).await;

        assert_eq!(
            *log.lock().unwrap(),
            vec![Err(CoreError::Timeout { deadline_ms: 50 })]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn operation_error_is_translated() {
        let (log, cb) = recorder();
        let guard = FetchGuard::new("test");

        guard.run(fail_after(5), ms(50), cb()).wait().await;

        assert_eq!(
            *log.lock().unwrap(),
            vec![Err(CoreError::Operation("backend unavailable".into()))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_fetch_is_inert() {
        let (log, cb) = recorder();
        let guard = FetchGuard::new("test");

        let handle = guard.run(after(100, 1), ms(1000), cb());
        tokio::time::sleep(ms(10)).await;
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(!guard.is_in_flight());

        tokio::time::sleep(ms(200)).await;
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn guard_cancel_is_inert() {
        let (log, cb) = recorder();
        let guard = FetchGuard::new("test");

        guard.run(after(100, 1), ms(1000), cb());
        guard.cancel();

        tokio::time::sleep(ms(200)).await;
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn latest_request_wins_when_older_is_slower() {
        let (log, cb) = recorder();
        let guard = FetchGuard::new("test");

        guard.run(after(500, 1), ms(1000), cb());
        guard.run(after(10, 2), ms(1000), cb());

        tokio::time::sleep(ms(600)).await;
        assert_eq!(*log.lock().unwrap(), vec![Ok(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn latest_request_wins_when_older_is_faster() {
        let (log, cb) = recorder();
        let guard = FetchGuard::new("test");

        guard.run(after(10, 1), ms(1000), cb());
        guard.run(after(50, 2), ms(1000), cb());

        tokio::time::sleep(ms(100)).await;
        assert_eq!(*log.lock().unwrap(), vec![Ok(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_parent_scope_stops_fetches() {
        let (log, cb) = recorder();
        let parent = CancellationToken::new();
        let guard = FetchGuard::with_scope("test", &parent);

        guard.run(after(100, 1), ms(1000), cb());
        parent.cancel();
        assert!(guard.is_closed());

        tokio::time::sleep(ms(200)).await;
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_guard_refuses_new_fetches() {
        let (log, cb) = recorder();
        let guard = FetchGuard::new("test");
        guard.close();

        guard.run(after(1, 1), ms(1000), cb()).wait().await;
        assert!(log.lock().unwrap().is_empty());
        assert!(!guard.is_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_guard_is_inert() {
        let (log, cb) = recorder();
        let guard = FetchGuard::new("test");

        guard.run(after(100, 1), ms(1000), cb());
        drop(guard);

        tokio::time::sleep(ms(200)).await;
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn handle_cancel_waits_for_running_settle() {
        let started = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let guard = FetchGuard::new("test");

        let handle = guard.run(after(1, 1), ms(1000), {
            let started = Arc::clone(&started);
            let finished = Arc::clone(&finished);
            move |_| {
                started.store(true, Ordering::SeqCst);
                std::thread::sleep(ms(50));
                finished.store(true, Ordering::SeqCst);
            }
        });
        while !started.load(Ordering::SeqCst) {
            tokio::time::sleep(ms(1)).await;
        }

        handle.cancel();
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancel_before_settle_is_inert_across_threads() {
        let (log, cb) = recorder();
        let guard = FetchGuard::new("test");

        for _ in 0..50 {
            let handle = guard.run(after(1, 1), ms(1000), cb());
            tokio::time::sleep(ms(1)).await;
            handle.cancel();
            let delivered = log.lock().unwrap().len();
            tokio::time::sleep(ms(5)).await;
            assert_eq!(log.lock().unwrap().len(), delivered);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn with_deadline_paths() {
        assert_eq!(with_deadline(after(5, 3), ms(10)).await, Ok(3));
        assert_eq!(
            with_deadline(after(20, 3), ms(10)).await,
            Err(CoreError::Timeout { deadline_ms: 10 })
        );
        assert_eq!(
            with_deadline(fail_after(1), ms(10)).await,
            Err(CoreError::Operation("backend unavailable".into()))
        );
    }
}
