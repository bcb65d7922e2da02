use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ItemId, ModelError, Record, Tone};

/// Predicted attrition risk bucket of an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Bucket a model probability in `[0, 1]`.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            RiskLevel::Critical
        } else if score >= 0.65 {
            RiskLevel::High
        } else if score >= 0.40 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            RiskLevel::Low => Tone::Positive,
            RiskLevel::Medium => Tone::Caution,
            RiskLevel::High => Tone::Critical,
            RiskLevel::Critical => Tone::Critical,
        }
    }
}

impl FromStr for RiskLevel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            _ => Err(ModelError::UnknownVariant {
                kind: "risk level",
                value: s.to_string(),
            }),
        }
    }
}

/// Follow-up state of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertStatus {
    Open,
    InProgress,
    Resolved,
}

impl AlertStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AlertStatus::Open => "Open",
            AlertStatus::InProgress => "In progress",
            AlertStatus::Resolved => "Resolved",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            AlertStatus::Open => Tone::Critical,
            AlertStatus::InProgress => Tone::Caution,
            AlertStatus::Resolved => Tone::Positive,
        }
    }
}

impl FromStr for AlertStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(AlertStatus::Open),
            "in_progress" | "in-progress" | "inprogress" => Ok(AlertStatus::InProgress),
            "resolved" => Ok(AlertStatus::Resolved),
            _ => Err(ModelError::UnknownVariant {
                kind: "alert status",
                value: s.to_string(),
            }),
        }
    }
}

/// Output of the attrition model for one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttritionAlert {
    pub id: ItemId,
    pub employee: String,
    pub department: String,
    /// Predicted probability of leaving within the horizon, in `[0, 1]`.
    pub score: f64,
    pub status: AlertStatus,
    /// Top contributing factors, most important first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub factors: Vec<String>,
    /// Last action registered by an HR partner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl AttritionAlert {
    pub fn risk(&self) -> RiskLevel {
        RiskLevel::from_score(self.score)
    }

    /// Critical and not yet handled.
    pub fn needs_attention(&self) -> bool {
        self.risk() == RiskLevel::Critical && self.status == AlertStatus::Open
    }
}

impl Record for AttritionAlert {
    fn id(&self) -> &ItemId {
        &self.id
    }
}
