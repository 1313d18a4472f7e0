pub mod answer;
pub mod assistant;
pub mod gemini;
pub mod pages;

pub use answer::{ParseError, ParsedAnswer, parse_response};
pub use assistant::{Answer, AssistantError, ManualAssistant, ManualAssistantBuilder};
pub use gemini::{GeminiClient, GeminiClientBuilder, ModelClient, ModelError};
pub use pages::{
    DisplayRequest, Grid, PageCollection, PageContent, PageError, PageIndex, Selection,
    SkippedInput, render, select,
};
