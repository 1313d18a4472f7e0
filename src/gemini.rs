/// Gemini HTTP client module.
///
/// This module provides a blocking client for the Gemini `generateContent`
/// endpoint, including error handling, retry logic, and timeout configuration.
mod client;

pub use client::{
    GeminiClient, GeminiClientBuilder, ModelClient, ModelError, retry_with_backoff,
};
