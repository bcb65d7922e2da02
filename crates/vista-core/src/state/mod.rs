use std::time::SystemTime;

use vista_model::{ResourceStatus, Section};

use crate::error::CoreError;

/// State of one fetched resource, carrying exactly the payload its status allows.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceState<T> {
    Idle,
    Loading,
    Ready { items: Vec<T> },
    Error { message: String },
}

impl<T> ResourceState<T> {
    pub fn status(&self) -> ResourceStatus {
        match self {
            ResourceState::Idle => ResourceStatus::Idle,
            ResourceState::Loading => ResourceStatus::Loading,
            ResourceState::Ready { .. } => ResourceStatus::Ready,
            ResourceState::Error { .. } => ResourceStatus::Error,
        }
    }
}

/// A named, fetchable collection owned by a single controller.
#[derive(Debug, Clone)]
pub struct Resource<T> {
    name: Section,
    state: ResourceState<T>,
    last_fetched_at: Option<SystemTime>,
}

impl<T> Resource<T> {
    /// Create an idle resource.
    pub fn new(name: Section) -> Self {
        Self {
            name,
            state: ResourceState::Idle,
            last_fetched_at: None,
        }
    }

    pub fn name(&self) -> Section {
        self.name
    }

    pub fn status(&self) -> ResourceStatus {
        self.state.status()
    }

    pub fn state(&self) -> &ResourceState<T> {
        &self.state
    }

    /// Items of a ready resource; `None` in every other status.
    pub fn items(&self) -> Option<&[T]> {
        match &self.state {
            ResourceState::Ready { items } => Some(items),
            _ => None,
        }
    }

    /// Message of a failed resource; `None` in every other status.
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            ResourceState::Error { message } => Some(message),
            _ => None,
        }
    }

    /// When the items of the latest successful fetch arrived.
    pub fn last_fetched_at(&self) -> Option<SystemTime> {
        self.last_fetched_at
    }

    /// The only state mutator. Rejects edges not allowed by [`ResourceStatus::can_transition_to`].
    pub fn transition_to(&mut self, next: ResourceState<T>) -> Result<(), CoreError> {
        let from = self.status();
        let to = next.status();
        if !from.can_transition_to(to) {
            return Err(CoreError::InvalidTransition { from, to });
        }

        if to == ResourceStatus::Ready {
            self.last_fetched_at = Some(SystemTime::now());
        }
        self.state = next;
        Ok(())
    }

    /// Swap the items of a ready resource without changing its status.
    ///
    /// Used for mutation write-back; rejected unless the resource is ready.
    pub fn replace_items(&mut self, items: Vec<T>) -> Result<(), CoreError> {
        match &mut self.state {
            ResourceState::Ready { items: current } => {
                *current = items;
                Ok(())
            }
            other => Err(CoreError::NotReady(other.status())),
        }
    }
}
