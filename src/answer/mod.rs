//! Extraction of the final answer and cited pages from raw model output.
//!
//! The model is asked to wrap its answer in `<final-answer>` tags and the
//! supporting page numbers in `<page-references>` tags. Everything else in
//! the response (reasoning, markdown, chatter) is ignored.

mod parser;
mod types;

pub use parser::{ParseError, parse_response};
pub use types::ParsedAnswer;
