use std::fmt;

use serde::{Deserialize, Serialize};

use super::Tone;

/// Kind of a transient user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotifyKind {
    Success,
    Error,
    Info,
}

impl NotifyKind {
    pub fn tone(&self) -> Tone {
        match self {
            NotifyKind::Success => Tone::Positive,
            NotifyKind::Error => Tone::Critical,
            NotifyKind::Info => Tone::Informative,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyKind::Success => "success",
            NotifyKind::Error => "error",
            NotifyKind::Info => "info",
        }
    }
}

impl fmt::Display for NotifyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
