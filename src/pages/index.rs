use serde::Serialize;
use std::fmt;

/// 1-based position of a page within the manual.
///
/// Only [`check_index`](super::check_index) constructs these from untrusted
/// input, so a `PageIndex` held by a [`DisplayRequest`](super::DisplayRequest)
/// is always within the page range it was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PageIndex(usize);

impl PageIndex {
    /// Creates a page index if `index` is within `1..=total_pages`.
    pub fn new(index: i64, total_pages: usize) -> Option<Self> {
        let index = usize::try_from(index).ok()?;
        (1..=total_pages).contains(&index).then_some(Self(index))
    }

    /// Returns the 1-based page number.
    pub fn get(self) -> usize {
        self.0
    }

    /// Returns the 0-based position of this page in a content store.
    pub fn offset(self) -> usize {
        self.0 - 1
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
