use std::{collections::HashSet, fmt::Display, future::Future, sync::Arc, sync::Mutex, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use uuid::Uuid;
use vista_model::{ItemId, MutationStatus, Section};

use crate::{
    Record,
    error::CoreError,
    fetch::{lock, with_deadline},
};

type PatchFn<T> = Arc<dyn Fn(&T) -> T + Send + Sync>;
type CheckFn<T> = Arc<dyn Fn(&T) -> Result<(), CoreError> + Send + Sync>;

/// A pending change to one record, identified by its [`ItemId`].
pub struct MutationRequest<T> {
    id: Uuid,
    target: ItemId,
    label: &'static str,
    patch: PatchFn<T>,
    check: Option<CheckFn<T>>,
}

impl<T> MutationRequest<T> {
    pub fn new(
        target: ItemId,
        label: &'static str,
        patch: impl Fn(&T) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            label,
            patch: Arc::new(patch),
            check: None,
        }
    }

    /// Local precondition evaluated on the patched record before any async call.
    pub fn with_check(
        mut self,
        check: impl Fn(&T) -> Result<(), CoreError> + Send + Sync + 'static,
    ) -> Self {
        self.check = Some(Arc::new(check));
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn target(&self) -> &ItemId {
        &self.target
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Apply the patch to `current` and run the precondition on the result.
    pub fn patched(&self, current: &T) -> Result<T, CoreError> {
        let next = (self.patch)(current);
        if let Some(check) = &self.check {
            check(&next)?;
        }
        Ok(next)
    }
}

/// Result of one dispatch.
///
/// `items` is the new collection on success and the untouched base collection otherwise.
#[derive(Debug, Clone)]
pub struct MutationOutcome<T> {
    pub request: Uuid,
    pub target: ItemId,
    pub status: MutationStatus,
    pub items: Vec<T>,
    pub error: Option<CoreError>,
}

impl<T: Record> MutationOutcome<T> {
    fn succeeded(request: Uuid, target: ItemId, items: Vec<T>) -> Self {
        Self {
            request,
            target,
            status: MutationStatus::Succeeded,
            items,
            error: None,
        }
    }

    fn failed(request: Uuid, target: ItemId, base: &[T], error: CoreError) -> Self {
        Self {
            request,
            target,
            status: MutationStatus::Failed,
            items: base.to_vec(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == MutationStatus::Succeeded
    }

    /// The record as written, when the mutation succeeded.
    pub fn updated(&self) -> Option<&T> {
        if !self.is_success() {
            return None;
        }
        self.items.iter().find(|item| item.id() == &self.target)
    }
}

/// Removes a target from the pending set when the dispatch ends, however it ends.
struct PendingGuard<'a> {
    set: &'a Mutex<HashSet<ItemId>>,
    id: ItemId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        lock(self.set).remove(&self.id);
    }
}

/// Applies single-record changes to a collection through a deadline-bounded persist call.
///
/// At most one mutation per target is in flight; a second one for the same
/// target is rejected with [`CoreError::MutationPending`] and changes nothing.
pub struct MutationDispatcher {
    name: Section,
    deadline: Duration,
    scope: CancellationToken,
    pending: Mutex<HashSet<ItemId>>,
}

impl MutationDispatcher {
    pub fn new(name: Section, deadline: Duration) -> Self {
        Self::with_scope(name, deadline, &CancellationToken::new())
    }

    pub fn with_scope(name: Section, deadline: Duration, parent: &CancellationToken) -> Self {
        Self {
            name,
            deadline,
            scope: parent.child_token(),
            pending: Mutex::new(HashSet::new()),
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// `true` while a mutation for `target` is in flight; the triggering control should be disabled.
    pub fn is_pending(&self, target: &ItemId) -> bool {
        lock(&self.pending).contains(target)
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Stop every in-flight persist call; they resolve as [`CoreError::Cancelled`].
    pub fn close(&self) {
        self.scope.cancel();
    }

    fn reserve(&self, target: &ItemId) -> Option<PendingGuard<'_>> {
        let mut pending = lock(&self.pending);
        if !pending.insert(target.clone()) {
            return None;
        }
        Some(PendingGuard {
            set: &self.pending,
            id: target.clone(),
        })
    }

    async fn persist<E, Fut>(&self, operation: Fut) -> Result<(), CoreError>
    where
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        tokio::select! {
            biased;
            _ = self.scope.cancelled() => Err(CoreError::Cancelled),
            res = with_deadline(operation, self.deadline) => res,
        }
    }

    /// Replace the target of `request` in `base` with its patched version once `persist` succeeds.
    #[instrument(level = "debug", skip_all, fields(section = self.name, target = %request.target(), action = request.label()))]
    pub async fn dispatch<T, E, Fut, P>(
        &self,
        base: &[T],
        request: MutationRequest<T>,
        persist: P,
    ) -> MutationOutcome<T>
    where
        T: Record,
        P: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let rid = request.id();
        let target = request.target().clone();

        if self.scope.is_cancelled() {
            return MutationOutcome::failed(rid, target, base, CoreError::Cancelled);
        }

        let Some(index) = base.iter().position(|item| item.id() == &target) else {
            warn!("mutation target not found");
            return MutationOutcome::failed(rid, target.clone(), base, CoreError::NotFound(target));
        };

        let next = match request.patched(&base[index]) {
            Ok(next) => next,
            Err(e) => {
                debug!(error = %e, "mutation rejected by local check");
                return MutationOutcome::failed(rid, target, base, e);
            }
        };

        let Some(_pending) = self.reserve(&target) else {
            debug!("mutation already pending; ignoring duplicate");
            return MutationOutcome::failed(
                rid,
                target.clone(),
                base,
                CoreError::MutationPending(target),
            );
        };

        debug!("persisting mutation");
        match self.persist(persist(next.clone())).await {
            Ok(()) => {
                let mut items = base.to_vec();
                items[index] = next;
                debug!("mutation persisted");
                MutationOutcome::succeeded(rid, target, items)
            }
            Err(e) => {
                warn!(error = %e, "mutation failed");
                MutationOutcome::failed(rid, target, base, e)
            }
        }
    }

    /// Prepend a new record to `base` once `persist` succeeds.
    ///
    /// `check` runs before any async call; an id already present in `base` is a validation error.
    #[instrument(level = "debug", skip_all, fields(section = self.name, target = %item.id()))]
    pub async fn create<T, E, Fut, P>(
        &self,
        base: &[T],
        item: T,
        check: impl Fn(&T) -> Result<(), CoreError>,
        persist: P,
    ) -> MutationOutcome<T>
    where
        T: Record,
        P: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let rid = Uuid::new_v4();
        let target = item.id().clone();

        if self.scope.is_cancelled() {
            return MutationOutcome::failed(rid, target, base, CoreError::Cancelled);
        }
        if base.iter().any(|existing| existing.id() == &target) {
            return MutationOutcome::failed(
                rid,
                target,
                base,
                CoreError::validation("id", "a record with this id already exists"),
            );
        }
        if let Err(e) = check(&item) {
            debug!(error = %e, "create rejected by local check");
            return MutationOutcome::failed(rid, target, base, e);
        }

        let Some(_pending) = self.reserve(&target) else {
            return MutationOutcome::failed(
                rid,
                target.clone(),
                base,
                CoreError::MutationPending(target),
            );
        };

        match self.persist(persist(item.clone())).await {
            Ok(()) => {
                let mut items = Vec::with_capacity(base.len() + 1);
                items.push(item);
                items.extend_from_slice(base);
                debug!("record created");
                MutationOutcome::succeeded(rid, target, items)
            }
            Err(e) => {
                warn!(error = %e, "create failed");
                MutationOutcome::failed(rid, target, base, e)
            }
        }
    }
}
