use serde::{Deserialize, Serialize};

/// Resolution state of one mutation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationStatus {
    /// Persist call in flight; the triggering control must stay disabled.
    Pending,
    Succeeded,
    Failed,
}

impl MutationStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, MutationStatus::Pending)
    }
}
