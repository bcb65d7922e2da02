//! Bounded async list controller: one per console section.
//!
//! Owns the section's [`Resource`], its [`QuerySpec`], a [`FetchGuard`] for
//! loads and a [`MutationDispatcher`] for writes, all under one cancellation
//! scope that closes when the controller is shut down or dropped.

use std::{
    fmt::Display,
    future::Future,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, SystemTime},
};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};
use vista_model::{
    ControllerEvent, EventKind, ItemId, NotifyKind, PageSlot, ResourceStatus, Section,
};

use crate::{
    Record,
    access::{AllowAll, CapabilityCheck},
    error::CoreError,
    event::{EventSink, NoopEvents},
    fetch::{FetchGuard, FetchHandle, deadline_ms, lock},
    mutation::{MutationDispatcher, MutationOutcome, MutationRequest},
    notify::{LogSink, NotificationSink},
    query::{self, DEFAULT_PAGE_SIZE, QueryResult, QuerySpec},
    source::DataSource,
    state::{Resource, ResourceState},
    window::compute_window,
};

/// Deadlines and paging defaults for one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    pub load_deadline: Duration,
    pub mutation_deadline: Duration,
    pub page_size: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            load_deadline: Duration::from_secs(8),
            mutation_deadline: Duration::from_secs(5),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ControllerConfig {
    pub fn with_load_deadline(mut self, deadline: Duration) -> Self {
        self.load_deadline = deadline;
        self
    }

    pub fn with_mutation_deadline(mut self, deadline: Duration) -> Self {
        self.mutation_deadline = deadline;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

/// Exactly one of the display states of a section.
#[derive(Debug, Clone, PartialEq)]
pub enum ListView<T> {
    Idle,
    Loading,
    /// Always rendered with a retry affordance.
    Error { message: String },
    /// Ready, but nothing to show. `filtered_out` distinguishes "no data" from "no match".
    Empty { filtered_out: bool },
    Ready(QueryResult<T>),
}

impl<T> ListView<T> {
    pub fn status(&self) -> ResourceStatus {
        match self {
            ListView::Idle => ResourceStatus::Idle,
            ListView::Loading => ResourceStatus::Loading,
            ListView::Error { .. } => ResourceStatus::Error,
            ListView::Empty { .. } | ListView::Ready(_) => ResourceStatus::Ready,
        }
    }

    /// Pagination buttons for this view; a single page unless content is shown.
    pub fn window(&self) -> Vec<PageSlot> {
        match self {
            ListView::Ready(result) => compute_window(result.page, result.total_pages),
            _ => compute_window(1, 1),
        }
    }
}

type Observer<T> = Arc<dyn Fn(&[T]) + Send + Sync>;

/// State shared between the controller and its own settle callbacks.
struct Shared<T> {
    name: Section,
    resource: Mutex<Resource<T>>,
    /// Current load generation; only changed while `resource` is locked.
    generation: AtomicU64,
    query: Mutex<QuerySpec<T>>,
    status_tx: watch::Sender<ResourceStatus>,
    notifier: Arc<dyn NotificationSink>,
    events: Arc<dyn EventSink>,
    observer: Option<Observer<T>>,
}

impl<T: Record> Shared<T> {
    fn emit(&self, event: ControllerEvent) {
        self.events.on_event(&event);
    }

    fn event(&self, kind: EventKind) -> ControllerEvent {
        ControllerEvent::new(kind, self.name)
    }

    /// Illegal transitions are programming errors and abort loudly.
    fn transition(&self, resource: &mut Resource<T>, next: ResourceState<T>) {
        if let Err(e) = resource.transition_to(next) {
            error!(section = self.name, error = %e, "resource state machine misuse");
            panic!("{}: {e}", self.name);
        }
        self.status_tx.send_replace(resource.status());
    }

    /// Re-clamp the page against the current filtered count.
    fn reclamp(&self, resource: &Resource<T>, query: &mut QuerySpec<T>) {
        let Some(items) = resource.items() else {
            return;
        };
        let before = query.page();
        let filtered = query.count_matching(items);
        *query = query.clone().clamped(filtered);
        if query.page() != before {
            debug!(section = self.name, from = before, to = query.page(), "page clamped");
            self.emit(
                self.event(EventKind::PageClamped)
                    .with_count(filtered)
                    .with_reason(format!("page {before} -> {}", query.page())),
            );
        }
    }

    /// Enter `loading` and return the generation the new load settles under.
    fn begin_load(&self) -> u64 {
        let mut resource = lock(&self.resource);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.transition(&mut resource, ResourceState::Loading);
        generation
    }

    /// Make every load started so far unable to settle.
    fn retire_loads(&self) {
        let _resource = lock(&self.resource);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn settle(&self, generation: u64, result: Result<Vec<T>, CoreError>) {
        let mut resource = lock(&self.resource);
        if self.generation.load(Ordering::SeqCst) != generation {
            trace!(section = self.name, generation, "stale load discarded");
            return;
        }
        match result {
            Ok(items) => {
                let count = items.len();
                let snapshot = self.observer.as_ref().map(|_| items.clone());
                {
                    self.transition(&mut resource, ResourceState::Ready { items });
                    let mut query = lock(&self.query);
                    self.reclamp(&resource, &mut query);
                }
                drop(resource);
                info!(section = self.name, count, "section loaded");
                self.emit(self.event(EventKind::FetchSucceeded).with_count(count));
                if let (Some(observer), Some(items)) = (&self.observer, snapshot) {
                    observer(&items);
                }
            }
            Err(e) => {
                let message = e.user_message();
                self.transition(
                    &mut resource,
                    ResourceState::Error {
                        message: message.clone(),
                    },
                );
                drop(resource);
                let kind = match e {
                    CoreError::Timeout { .. } => EventKind::FetchTimedOut,
                    _ => EventKind::FetchFailed,
                };
                warn!(section = self.name, error = %e, "section failed to load");
                self.emit(self.event(kind).with_reason(e.to_string()));
                self.notifier.notify(NotifyKind::Error, &message);
            }
        }
    }

    /// Write a persisted record back into the current items.
    ///
    /// A resource that is no longer ready (reload in flight) keeps its state;
    /// the reload brings the fresh record.
    fn write_back(&self, record: T, insert: bool) -> Option<Vec<T>> {
        let mut resource = lock(&self.resource);
        let mut items = resource.items()?.to_vec();
        match items.iter().position(|item| item.id() == record.id()) {
            Some(index) => items[index] = record,
            None if insert => items.insert(0, record),
            None => return None,
        }
        resource.replace_items(items.clone()).ok()?;
        let mut query = lock(&self.query);
        self.reclamp(&resource, &mut query);
        Some(items)
    }
}

/// Builder for [`ListController`].
pub struct ListControllerBuilder<T> {
    name: Section,
    source: Arc<dyn DataSource<T>>,
    config: ControllerConfig,
    query: Option<QuerySpec<T>>,
    notifier: Arc<dyn NotificationSink>,
    events: Arc<dyn EventSink>,
    capabilities: Arc<dyn CapabilityCheck>,
    observer: Option<Observer<T>>,
    parent: Option<CancellationToken>,
}

impl<T: Record> ListControllerBuilder<T> {
    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Initial query; its page size wins over the config's.
    pub fn query(mut self, query: QuerySpec<T>) -> Self {
        self.query = Some(query);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn capabilities(mut self, capabilities: Arc<dyn CapabilityCheck>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Called with the full collection after every successful load or write,
    /// to push a derived value to a parent.
    pub fn observer(mut self, observer: impl Fn(&[T]) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Tie the controller's lifetime to an outer scope (e.g. the page owning several sections).
    pub fn scope(mut self, parent: &CancellationToken) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn build(self) -> ListController<T> {
        let scope = match &self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        let query = self
            .query
            .unwrap_or_else(|| QuerySpec::new().with_page_size(self.config.page_size));
        let (status_tx, _) = watch::channel(ResourceStatus::Idle);

        ListController {
            name: self.name,
            config: self.config,
            fetch: FetchGuard::with_scope(self.name, &scope),
            dispatcher: MutationDispatcher::with_scope(
                self.name,
                self.config.mutation_deadline,
                &scope,
            ),
            scope,
            source: self.source,
            capabilities: self.capabilities,
            shared: Arc::new(Shared {
                name: self.name,
                resource: Mutex::new(Resource::new(self.name)),
                generation: AtomicU64::new(0),
                query: Mutex::new(query),
                status_tx,
                notifier: self.notifier,
                events: self.events,
                observer: self.observer,
            }),
        }
    }
}

pub struct ListController<T> {
    name: Section,
    config: ControllerConfig,
    scope: CancellationToken,
    fetch: FetchGuard,
    dispatcher: MutationDispatcher,
    source: Arc<dyn DataSource<T>>,
    capabilities: Arc<dyn CapabilityCheck>,
    shared: Arc<Shared<T>>,
}

impl<T: Record> ListController<T> {
    pub fn builder(name: Section, source: Arc<dyn DataSource<T>>) -> ListControllerBuilder<T> {
        ListControllerBuilder {
            name,
            source,
            config: ControllerConfig::default(),
            query: None,
            notifier: Arc::new(LogSink),
            events: Arc::new(NoopEvents),
            capabilities: Arc::new(AllowAll),
            observer: None,
            parent: None,
        }
    }

    pub fn name(&self) -> Section {
        self.name
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Start (or restart) loading the collection. Supersedes any load in flight.
    ///
    /// Only the most recently started load may settle the resource; an older
    /// one that completes later is discarded.
    #[instrument(level = "debug", skip(self), fields(section = self.name))]
    pub fn load(&self) -> FetchHandle {
        let shared = &self.shared;
        if self.fetch.cancel() {
            shared.emit(shared.event(EventKind::FetchSuperseded));
        }
        let generation = shared.begin_load();
        shared.emit(
            shared
                .event(EventKind::FetchStarted)
                .with_deadline_ms(deadline_ms(self.config.load_deadline)),
        );

        let source = Arc::clone(&self.source);
        let shared = Arc::clone(&self.shared);
        self.fetch.run(
            async move { source.fetch().await },
            self.config.load_deadline,
            move |result| shared.settle(generation, result),
        )
    }

    /// Re-run exactly the same fetch; bound to the error view's retry button.
    pub fn retry(&self) -> FetchHandle {
        debug!(section = self.name, "retry requested");
        self.load()
    }

    /// Drop interest in the load in flight. The resource keeps its current status.
    pub fn cancel(&self) {
        if self.fetch.cancel() {
            self.shared.retire_loads();
            self.shared.emit(self.shared.event(EventKind::FetchCancelled));
        }
    }

    /// Close the controller's scope: every in-flight load and write becomes inert.
    pub fn shutdown(&self) {
        if self.scope.is_cancelled() {
            return;
        }
        self.fetch.close();
        self.shared.retire_loads();
        self.dispatcher.close();
        self.scope.cancel();
        debug!(section = self.name, "controller scope closed");
        self.shared.emit(self.shared.event(EventKind::ScopeClosed));
    }

    pub fn is_closed(&self) -> bool {
        self.scope.is_cancelled()
    }

    pub fn status(&self) -> ResourceStatus {
        lock(&self.shared.resource).status()
    }

    pub fn error_message(&self) -> Option<String> {
        lock(&self.shared.resource).error_message().map(str::to_string)
    }

    pub fn last_fetched_at(&self) -> Option<SystemTime> {
        lock(&self.shared.resource).last_fetched_at()
    }

    /// Copy of the full, unfiltered collection when ready.
    pub fn items(&self) -> Result<Vec<T>, CoreError> {
        let resource = lock(&self.shared.resource);
        resource
            .items()
            .map(<[T]>::to_vec)
            .ok_or(CoreError::NotReady(resource.status()))
    }

    /// Receiver that observes every status change.
    pub fn subscribe(&self) -> watch::Receiver<ResourceStatus> {
        self.shared.status_tx.subscribe()
    }

    pub fn query(&self) -> QuerySpec<T> {
        lock(&self.shared.query).clone()
    }

    /// Replace the query with `f(current)` and re-clamp its page.
    pub fn update_query(&self, f: impl FnOnce(QuerySpec<T>) -> QuerySpec<T>) -> QuerySpec<T> {
        let resource = lock(&self.shared.resource);
        let mut query = lock(&self.shared.query);
        *query = f(query.clone());
        self.shared.reclamp(&resource, &mut query);
        query.clone()
    }

    /// The single display state to render right now.
    pub fn view(&self) -> ListView<T> {
        let resource = lock(&self.shared.resource);
        match resource.state() {
            ResourceState::Idle => ListView::Idle,
            ResourceState::Loading => ListView::Loading,
            ResourceState::Error { message } => ListView::Error {
                message: message.clone(),
            },
            ResourceState::Ready { items } => {
                let query = lock(&self.shared.query);
                let result = query::apply(items, &query);
                if result.is_empty() {
                    ListView::Empty {
                        filtered_out: !items.is_empty(),
                    }
                } else {
                    ListView::Ready(result)
                }
            }
        }
    }

    pub fn window(&self) -> Vec<PageSlot> {
        self.view().window()
    }

    pub fn can_mutate(&self, subject: &str, action: &str) -> bool {
        self.capabilities.has_capability(subject, action)
    }

    /// `true` while a write for `target` is in flight.
    pub fn is_pending(&self, target: &ItemId) -> bool {
        self.dispatcher.is_pending(target)
    }

    /// Apply `request` once `persist` succeeds, and report through notifications.
    ///
    /// Validation errors are returned without a notification; the caller
    /// renders them next to the offending field.
    #[instrument(level = "debug", skip_all, fields(section = self.name, target = %request.target()))]
    pub async fn dispatch<E, Fut, P>(
        &self,
        request: MutationRequest<T>,
        persist: P,
    ) -> Result<T, CoreError>
    where
        P: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let base = self.items()?;
        let label = request.label();
        self.shared.emit(
            self.shared
                .event(EventKind::MutationStarted)
                .with_item(request.target().clone())
                .with_reason(label),
        );
        let outcome = self.dispatcher.dispatch(&base, request, persist).await;
        self.finish(outcome, label, false)
    }

    /// Insert `item` at the top of the collection once `persist` succeeds.
    #[instrument(level = "debug", skip_all, fields(section = self.name, target = %item.id()))]
    pub async fn create<E, Fut, P>(
        &self,
        item: T,
        check: impl Fn(&T) -> Result<(), CoreError>,
        persist: P,
    ) -> Result<T, CoreError>
    where
        P: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let base = self.items()?;
        self.shared.emit(
            self.shared
                .event(EventKind::MutationStarted)
                .with_item(item.id().clone())
                .with_reason("create"),
        );
        let outcome = self.dispatcher.create(&base, item, check, persist).await;
        self.finish(outcome, "create", true)
    }

    fn finish(
        &self,
        outcome: MutationOutcome<T>,
        label: &'static str,
        insert: bool,
    ) -> Result<T, CoreError> {
        let shared = &self.shared;
        let target = outcome.target.clone();

        if let Some(record) = outcome.updated().cloned() {
            match shared.write_back(record.clone(), insert) {
                Some(items) => {
                    if let Some(observer) = &shared.observer {
                        observer(&items);
                    }
                }
                None => debug!(section = self.name, %target, "resource changed during write; skipping write-back"),
            }
            shared.emit(shared.event(EventKind::MutationSucceeded).with_item(target));
            shared.notifier.notify(NotifyKind::Success, &format!("{label}: saved"));
            return Ok(record);
        }

        let e = outcome
            .error
            .unwrap_or_else(|| CoreError::Operation("mutation failed without a reason".into()));
        match &e {
            CoreError::Validation { .. } | CoreError::MutationPending(_) => {
                shared.emit(
                    shared
                        .event(EventKind::MutationRejected)
                        .with_item(target)
                        .with_reason(e.to_string()),
                );
            }
            CoreError::Cancelled => {
                debug!(section = self.name, %target, "write cancelled with its scope");
            }
            _ => {
                warn!(section = self.name, %target, error = %e, "write failed");
                shared.emit(
                    shared
                        .event(EventKind::MutationFailed)
                        .with_item(target)
                        .with_reason(e.to_string()),
                );
                shared
                    .notifier
                    .notify(NotifyKind::Error, &format!("{label}: {}", e.user_message()));
            }
        }
        Err(e)
    }
}

impl<T> Drop for ListController<T> {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}
