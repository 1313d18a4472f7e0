use serde::Serialize;

/// Structured result of parsing one model response.
///
/// Built once per query by [`parse_response`](super::parse_response) and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedAnswer {
    /// Trimmed, non-empty content of the final-answer region
    answer: String,
    /// Page numbers in the order the model listed them, duplicates included
    page_references: Vec<i64>,
    /// Tokens from the page-reference region that were not integers
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dropped_tokens: Vec<String>,
}

impl ParsedAnswer {
    pub(crate) fn new(
        answer: String,
        page_references: Vec<i64>,
        dropped_tokens: Vec<String>,
    ) -> Self {
        Self {
            answer,
            page_references,
            dropped_tokens,
        }
    }

    /// Returns the answer text.
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Returns the cited page numbers, unvalidated.
    ///
    /// Zero and negative values can appear here; range checks happen in
    /// [`crate::pages::select`].
    pub fn page_references(&self) -> &[i64] {
        &self.page_references
    }

    /// Returns the non-numeric tokens dropped from the page-reference region.
    pub fn dropped_tokens(&self) -> &[String] {
        &self.dropped_tokens
    }

    /// Returns true if the model cited at least one page.
    pub fn has_page_references(&self) -> bool {
        !self.page_references.is_empty()
    }
}
