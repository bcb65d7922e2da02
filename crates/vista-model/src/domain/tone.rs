use serde::{Deserialize, Serialize};

/// Visual intent of a label or badge.
///
/// Every status enum in the console maps to a tone through a total `match`,
/// so adding a variant fails to compile until it is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tone {
    Positive,
    Caution,
    Critical,
    Informative,
    Muted,
}

impl Tone {
    /// Short marker used by the text renderer.
    pub fn marker(&self) -> &'static str {
        match self {
            Tone::Positive => "[+]",
            Tone::Caution => "[~]",
            Tone::Critical => "[!]",
            Tone::Informative => "[i]",
            Tone::Muted => "[ ]",
        }
    }

    /// ANSI SGR color code for terminals that support it.
    pub fn ansi(&self) -> &'static str {
        match self {
            Tone::Positive => "32",
            Tone::Caution => "33",
            Tone::Critical => "31",
            Tone::Informative => "36",
            Tone::Muted => "90",
        }
    }
}
