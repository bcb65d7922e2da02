use std::fmt;

use serde::{Deserialize, Serialize};

/// One button of a pagination bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageSlot {
    /// A clickable 1-based page number.
    Page(usize),
    /// A gap of one or more hidden pages.
    Ellipsis,
}

impl PageSlot {
    pub fn page(&self) -> Option<usize> {
        match self {
            PageSlot::Page(n) => Some(*n),
            PageSlot::Ellipsis => None,
        }
    }
}

impl fmt::Display for PageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSlot::Page(n) => write!(f, "{n}"),
            PageSlot::Ellipsis => f.write_str("…"),
        }
    }
}
