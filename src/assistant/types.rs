//! Types for answered questions.

use crate::answer::ParsedAnswer;
use crate::pages::{Grid, PageCollection, PageContent, Selection, SkippedInput, render};

/// Result of one question: the parsed answer and the pages to show with it.
#[derive(Debug, Clone)]
pub struct Answer {
    parsed: ParsedAnswer,
    selection: Selection,
}

impl Answer {
    pub(crate) fn new(parsed: ParsedAnswer, selection: Selection) -> Self {
        Self { parsed, selection }
    }

    /// Returns the answer text.
    pub fn text(&self) -> &str {
        self.parsed.answer()
    }

    /// Returns the full parse result, including raw page references.
    pub fn parsed(&self) -> &ParsedAnswer {
        &self.parsed
    }

    /// Returns the validated page selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Returns the cited pages that could not be shown.
    pub fn skipped_inputs(&self) -> &[SkippedInput] {
        self.selection.skipped_inputs()
    }

    /// Lays out the cited pages of `pages`.
    ///
    /// Returns `None` when no cited page survived validation. `pages` must be
    /// the collection whose length the selection was checked against.
    pub fn grid<'a>(&self, pages: &'a PageCollection) -> Option<Grid<'a, PageContent>> {
        self.selection
            .display_request()
            .map(|request| render(pages.as_slice(), request.valid_indexes(), request.columns()))
    }
}
