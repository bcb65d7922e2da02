use serde::{Deserialize, Serialize};

use crate::{ItemId, Record, Tone};

/// Console feature flag managed from the admin section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlag {
    pub id: ItemId,
    pub key: String,
    pub description: String,
    pub enabled: bool,
}

impl FeatureFlag {
    pub fn toggled(&self) -> Self {
        Self {
            enabled: !self.enabled,
            ..self.clone()
        }
    }

    pub fn label(&self) -> &'static str {
        if self.enabled { "Enabled" } else { "Disabled" }
    }

    pub fn tone(&self) -> Tone {
        if self.enabled { Tone::Positive } else { Tone::Muted }
    }
}

impl Record for FeatureFlag {
    fn id(&self) -> &ItemId {
        &self.id
    }
}
