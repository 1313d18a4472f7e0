//! Question answering implementation using a long-context model.

use std::num::NonZeroUsize;
use std::sync::Arc;

use thiserror::Error;

use crate::answer::{ParseError, parse_response};
use crate::gemini::{ModelClient, ModelError};
use crate::pages::{PageCollection, PageError, select_references};

use super::types::Answer;

/// Prompt template asking for the two tagged regions the parser expects.
const PROMPT_TEMPLATE: &str = r#"You are a support engineer answering questions about a factory machine. The machine's complete manual has been provided to you as a sequence of page images. The manual has {page_count} pages; the first image is page 1 and page numbers count up in the order the images were given.

Answer the question using ONLY the manual. Work through the relevant sections first, then give your final answer.

QUESTION:
{question}

Finish your response with exactly these two blocks:
<final-answer>The answer for the machine operator, including values and units exactly as written in the manual.</final-answer>
<page-references>Comma-separated page numbers that support the answer, e.g. 12, 40</page-references>

If the manual does not answer the question, say so inside <final-answer> and leave <page-references> empty."#;

/// Errors that end a single question.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Pages(#[from] PageError),
}

/// Builder for constructing `ManualAssistant` instances.
#[derive(Default)]
pub struct ManualAssistantBuilder {
    client: Option<Arc<dyn ModelClient>>,
}

impl ManualAssistantBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model client to use.
    pub fn client(mut self, client: Arc<dyn ModelClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the `ManualAssistant`.
    ///
    /// # Panics
    ///
    /// Panics if `client()` was not called.
    #[must_use]
    pub fn build(self) -> ManualAssistant {
        ManualAssistant {
            client: self.client.expect("client must be set via client() method"),
        }
    }
}

/// Answers questions about a manual held in the model's context cache.
pub struct ManualAssistant {
    client: Arc<dyn ModelClient>,
}

impl ManualAssistant {
    /// Creates a new `ManualAssistant` with the specified client.
    #[must_use]
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    /// Asks a question and validates the cited pages against `pages`.
    ///
    /// # Arguments
    ///
    /// * `question` - The operator's question
    /// * `pages` - The manual's page images, in the order the model saw them
    /// * `columns` - Column count for laying out cited pages
    ///
    /// # Errors
    ///
    /// Fails with [`PageError::InvalidColumns`] before calling the model if
    /// `columns` is zero, with [`ModelError`] if the call fails, and with
    /// [`ParseError::MissingAnswer`] if the response has no answer region.
    pub fn ask(
        &self,
        question: &str,
        pages: &PageCollection,
        columns: usize,
    ) -> Result<Answer, AssistantError> {
        NonZeroUsize::new(columns).ok_or(PageError::InvalidColumns { columns })?;

        let prompt = build_prompt(question, pages.len());
        let response = self.client.generate(&prompt)?;

        interpret_response(&response, pages.len(), columns)
    }
}

/// Fills the prompt template for a question over a manual of `page_count` pages.
pub fn build_prompt(question: &str, page_count: usize) -> String {
    PROMPT_TEMPLATE
        .replace("{page_count}", &page_count.to_string())
        .replace("{question}", question.trim())
}

/// Parses a raw model response and selects its cited pages.
///
/// # Errors
///
/// Returns [`ParseError::MissingAnswer`] if the response has no answer
/// region, then [`PageError::InvalidColumns`] if `columns` is zero.
pub fn interpret_response(
    raw: &str,
    total_pages: usize,
    columns: usize,
) -> Result<Answer, AssistantError> {
    let parsed = parse_response(raw)?;
    let selection = select_references(total_pages, parsed.page_references(), columns)?;

    Ok(Answer::new(parsed, selection))
}
