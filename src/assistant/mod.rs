//! Question answering over a cached machine manual.
//!
//! This module provides the `ManualAssistant` struct which sends a question
//! to a `ModelClient`, then parses and validates the response into an answer
//! and a set of displayable pages.

mod manual_assistant;
mod types;

pub use manual_assistant::{
    AssistantError, ManualAssistant, ManualAssistantBuilder, build_prompt, interpret_response,
};
pub use types::Answer;
