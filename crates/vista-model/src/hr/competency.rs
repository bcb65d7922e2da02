use serde::{Deserialize, Serialize};

use crate::{ItemId, Record, Tone};

/// Proficiency of one employee in one competency, on a 1–5 scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competency {
    pub id: ItemId,
    pub employee: String,
    pub name: String,
    pub current: u8,
    pub required: u8,
}

impl Competency {
    /// Levels still missing to reach the requirement, never negative.
    pub fn gap(&self) -> u8 {
        self.required.saturating_sub(self.current)
    }

    /// Coverage of the requirement in percent, capped at 100.
    pub fn coverage(&self) -> u8 {
        if self.required == 0 {
            return 100;
        }
        let pct = u32::from(self.current) * 100 / u32::from(self.required);
        pct.min(100) as u8
    }

    pub fn tone(&self) -> Tone {
        match self.gap() {
            0 => Tone::Positive,
            1 => Tone::Caution,
            _ => Tone::Critical,
        }
    }
}

impl Record for Competency {
    fn id(&self) -> &ItemId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn competency(current: u8, required: u8) -> Competency {
        Competency {
            id: ItemId::from("c1"),
            employee: "Bruno".into(),
            name: "Negotiation".into(),
            current,
            required,
        }
    }

    #[test]
    fn gap_is_floored_at_zero() {
        assert_eq!(competency(2, 4).gap(), 2);
        assert_eq!(competency(5, 3).gap(), 0);
    }

    #[test]
    fn coverage_is_capped() {
        assert_eq!(competency(3, 4).coverage(), 75);
        assert_eq!(competency(5, 3).coverage(), 100);
        assert_eq!(competency(0, 0).coverage(), 100);
    }

    #[test]
    fn tone_follows_gap() {
        assert_eq!(competency(4, 4).tone(), Tone::Positive);
        assert_eq!(competency(3, 4).tone(), Tone::Caution);
        assert_eq!(competency(1, 4).tone(), Tone::Critical);
    }
}
