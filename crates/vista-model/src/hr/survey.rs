use serde::{Deserialize, Serialize};

use crate::{ItemId, Record, Tone};

/// Publication state of a survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SurveyStatus {
    Draft,
    Active,
    Closed,
}

impl SurveyStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SurveyStatus::Draft => "Draft",
            SurveyStatus::Active => "Active",
            SurveyStatus::Closed => "Closed",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            SurveyStatus::Draft => Tone::Muted,
            SurveyStatus::Active => Tone::Informative,
            SurveyStatus::Closed => Tone::Positive,
        }
    }
}

/// Employee Net Promoter Score band.
///
/// eNPS ranges over `[-100, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnpsBand {
    /// `score >= 30`
    Favorable,
    /// `0 <= score < 30`
    Neutral,
    /// `score < 0`
    Critical,
}

impl EnpsBand {
    pub fn from_score(score: i32) -> Self {
        if score >= 30 {
            EnpsBand::Favorable
        } else if score >= 0 {
            EnpsBand::Neutral
        } else {
            EnpsBand::Critical
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EnpsBand::Favorable => "Favorable",
            EnpsBand::Neutral => "Neutral",
            EnpsBand::Critical => "Critical",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            EnpsBand::Favorable => Tone::Positive,
            EnpsBand::Neutral => Tone::Caution,
            EnpsBand::Critical => Tone::Critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: ItemId,
    pub title: String,
    pub status: SurveyStatus,
    pub invited: u32,
    pub responses: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enps: Option<i32>,
}

impl Survey {
    /// Fraction of invited employees who answered, `None` when nobody was invited.
    pub fn response_rate(&self) -> Option<f64> {
        if self.invited == 0 {
            return None;
        }
        Some(f64::from(self.responses.min(self.invited)) / f64::from(self.invited))
    }

    pub fn enps_band(&self) -> Option<EnpsBand> {
        self.enps.map(EnpsBand::from_score)
    }
}

impl Record for Survey {
    fn id(&self) -> &ItemId {
        &self.id
    }
}
