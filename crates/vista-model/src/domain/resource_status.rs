use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of one fetched resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceStatus {
    /// Nothing requested yet.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// Items reflect the latest completed fetch.
    Ready,
    /// The latest fetch failed or timed out.
    Error,
}

impl ResourceStatus {
    /// Returns `true` if the edge `self -> next` is a legal transition.
    ///
    /// `loading -> loading` is allowed: a newer fetch supersedes the one in flight.
    pub fn can_transition_to(&self, next: ResourceStatus) -> bool {
        matches!(
            (self, next),
            (ResourceStatus::Idle, ResourceStatus::Loading)
                | (ResourceStatus::Loading, ResourceStatus::Loading)
                | (ResourceStatus::Loading, ResourceStatus::Ready)
                | (ResourceStatus::Loading, ResourceStatus::Error)
                | (ResourceStatus::Ready, ResourceStatus::Loading)
                | (ResourceStatus::Error, ResourceStatus::Loading)
        )
    }

    /// Returns `true` if the resource has settled (ready or error).
    pub fn is_settled(&self) -> bool {
        matches!(self, ResourceStatus::Ready | ResourceStatus::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStatus::Idle => "idle",
            ResourceStatus::Loading => "loading",
            ResourceStatus::Ready => "ready",
            ResourceStatus::Error => "error",
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
