/// Gemini HTTP client implementation.
///
/// This module provides `GeminiClient` for making synchronous requests to the
/// Gemini API, along with error types and builder patterns for configuration.
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model; must match the model the context cache was created for.
const DEFAULT_MODEL: &str = "gemini-1.5-pro-002";

/// Answers over a whole manual routinely take about a minute.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Backoff between retries of transient failures.
const RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// Errors that can occur when calling the model API.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code and response body
    #[error("HTTP error: status {status}: {body}")]
    Http { status: u16, body: String },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The API answered but the payload carried no usable text
    #[error("Gemini API error: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No API key was configured
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
}

impl ModelError {
    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Network(error)
        }
    }
}

/// Trait for text generation against a hosted model.
///
/// This trait enables mocking in unit tests and keeps the question-answering
/// pipeline independent of the HTTP transport.
pub trait ModelClient: Send + Sync {
    /// Sends `prompt` to the model and returns its raw text response.
    fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Builder for constructing `GeminiClient` instances.
///
/// # Examples
///
/// ```
/// use manual_qa::gemini::GeminiClientBuilder;
///
/// let client = GeminiClientBuilder::new()
///     .api_key("test-key")
///     .cached_content("cachedContents/manual-123")
///     .build()
///     .expect("Failed to create client");
/// assert_eq!(client.cached_content(), Some("cachedContents/manual-123"));
/// ```
#[derive(Debug, Default)]
pub struct GeminiClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    cached_content: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiClientBuilder {
    /// Creates a new `GeminiClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL for the Gemini API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model name (e.g., "gemini-1.5-pro-002").
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the cached content resource holding the manual's pages.
    ///
    /// # Arguments
    ///
    /// * `name` - Resource name as returned by the caching API
    ///   (e.g., "cachedContents/abc123")
    pub fn cached_content(mut self, name: impl Into<String>) -> Self {
        self.cached_content = Some(name.into());
        self
    }

    /// Overrides the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the `GeminiClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// Values not set on the builder are read from `GEMINI_BASE_URL`,
    /// `GEMINI_API_KEY`, `GEMINI_MODEL` and `GEMINI_CACHED_CONTENT`. The base
    /// URL and model fall back to built-in defaults; the API key is required.
    pub fn build(self) -> Result<GeminiClient, ModelError> {
        let base_url = self
            .base_url
            .or_else(|| env_non_empty("GEMINI_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let api_key = self
            .api_key
            .or_else(|| env_non_empty("GEMINI_API_KEY"))
            .ok_or(ModelError::MissingApiKey)?;

        let model = self
            .model
            .or_else(|| env_non_empty("GEMINI_MODEL"))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let cached_content = self
            .cached_content
            .or_else(|| env_non_empty("GEMINI_CACHED_CONTENT"));

        reqwest::Url::parse(&base_url)
            .map_err(|e| ModelError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(ModelError::Network)?;

        Ok(GeminiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.trim_start_matches("models/").to_string(),
            cached_content,
        })
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Synchronous client for the Gemini `generateContent` endpoint.
///
/// It should be constructed using `GeminiClientBuilder`.
pub struct GeminiClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    model: String,
    cached_content: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cached_content: Option<&'a str>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the model name configured for this client.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the cached content resource, if one is configured.
    pub fn cached_content(&self) -> Option<&str> {
        self.cached_content.as_deref()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn generate_internal(&self, prompt: &str) -> Result<String, ModelError> {
        let url = self.endpoint();
        let request_body = build_request(prompt, self.cached_content.as_deref());
        log::debug!(
            "POST {} (cached content: {})",
            url,
            self.cached_content.as_deref().unwrap_or("none")
        );

        retry_with_backoff(|| {
            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body)
                .send()
                .map_err(ModelError::from_reqwest)?;

            let status = response.status();
            let body = response.text().map_err(ModelError::from_reqwest)?;
            if !status.is_success() {
                return Err(ModelError::Http {
                    status: status.as_u16(),
                    body,
                });
            }

            let parsed: GenerateContentResponse =
                serde_json::from_str(&body).map_err(ModelError::Serialization)?;
            extract_text(parsed)
        })
    }
}

impl ModelClient for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        self.generate_internal(prompt)
    }
}

fn build_request<'a>(
    prompt: &'a str,
    cached_content: Option<&'a str>,
) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![Part { text: prompt }],
        }],
        cached_content,
    }
}

/// Joins the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String, ModelError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::Api {
            message: "Response contained no candidates".to_string(),
        })?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(ModelError::Api {
            message: format!(
                "Candidate contained no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ),
        });
    }

    Ok(text)
}

/// Retries an operation with exponential backoff.
///
/// This function will retry the operation up to 3 times with delays of 1s, 2s, and 4s.
/// It only retries on transient errors (network errors, HTTP 429 and 5xx).
pub fn retry_with_backoff<F, T>(f: F) -> Result<T, ModelError>
where
    F: FnMut() -> Result<T, ModelError>,
{
    retry_with_delays(&RETRY_DELAYS, f)
}

fn retry_with_delays<F, T>(delays: &[Duration], mut f: F) -> Result<T, ModelError>
where
    F: FnMut() -> Result<T, ModelError>,
{
    let mut last_error = match f() {
        Ok(result) => return Ok(result),
        Err(e) if !should_retry(&e) => return Err(e),
        Err(e) => e,
    };

    for (attempt, delay) in delays.iter().enumerate() {
        log::info!(
            "Retrying model request in {:?} (attempt {} of {}): {}",
            delay,
            attempt + 1,
            delays.len(),
            last_error
        );
        thread::sleep(*delay);

        match f() {
            Ok(result) => return Ok(result),
            Err(e) if !should_retry(&e) => return Err(e),
            Err(e) => last_error = e,
        }
    }

    Err(last_error)
}

/// Determines if an error should be retried.
///
/// Timeouts are not retried: a request that ran for the full timeout is
/// unlikely to finish on the next attempt.
fn should_retry(error: &ModelError) -> bool {
    match error {
        ModelError::Network(_) => true,
        ModelError::Http { status, .. } => *status == 429 || (500..600).contains(status),
        ModelError::Timeout(_)
        | ModelError::Serialization(_)
        | ModelError::Api { .. }
        | ModelError::InvalidUrl(_)
        | ModelError::MissingApiKey => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const NO_DELAYS: [Duration; 3] = [Duration::ZERO; 3];

    fn network_error() -> ModelError {
        ModelError::Network(
            reqwest::blocking::Client::new()
                .get("not-a-valid-url")
                .build()
                .unwrap_err(),
        )
    }

    fn clear_env() {
        unsafe {
            for name in [
                "GEMINI_BASE_URL",
                "GEMINI_API_KEY",
                "GEMINI_MODEL",
                "GEMINI_CACHED_CONTENT",
            ] {
                std::env::remove_var(name);
            }
        }
    }

    #[test]
    fn http_error_includes_status_and_body() {
        let err = ModelError::Http {
            status: 403,
            body: "cache expired".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("cache expired"));
    }

    #[test]
    fn serialization_error_keeps_source() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err = ModelError::Serialization(json_error);

        assert!(err.to_string().contains("Serialization error"));
        assert!(err.source().is_some());
    }

    #[test]
    #[serial]
    fn build_uses_defaults_when_only_key_given() {
        clear_env();

        let client = GeminiClientBuilder::new().api_key("k").build().unwrap();

        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert_eq!(client.cached_content(), None);
    }

    #[test]
    #[serial]
    fn build_reads_environment_variables() {
        clear_env();
        unsafe {
            std::env::set_var("GEMINI_API_KEY", "env-key");
            std::env::set_var("GEMINI_MODEL", "models/gemini-1.5-flash-002");
            std::env::set_var("GEMINI_CACHED_CONTENT", "cachedContents/xyz");
            std::env::set_var("GEMINI_BASE_URL", "http://localhost:8080/");
        }

        let client = GeminiClientBuilder::new().build();
        clear_env();

        let client = client.unwrap();
        assert_eq!(client.model(), "gemini-1.5-flash-002");
        assert_eq!(client.cached_content(), Some("cachedContents/xyz"));
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(
            client.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-1.5-flash-002:generateContent"
        );
    }

    #[test]
    #[serial]
    fn builder_values_override_environment() {
        clear_env();
        unsafe {
            std::env::set_var("GEMINI_MODEL", "from-env");
        }

        let client = GeminiClientBuilder::new()
            .api_key("k")
            .model("from-builder")
            .build();
        clear_env();

        assert_eq!(client.unwrap().model(), "from-builder");
    }

    #[test]
    #[serial]
    fn build_requires_api_key() {
        clear_env();

        let result = GeminiClientBuilder::new().build();

        assert!(matches!(result, Err(ModelError::MissingApiKey)));
    }

    #[test]
    #[serial]
    fn build_rejects_invalid_url() {
        clear_env();

        let result = GeminiClientBuilder::new()
            .api_key("k")
            .base_url("not-a-valid-url")
            .build();

        assert!(matches!(result, Err(ModelError::InvalidUrl(_))));
    }

    #[test]
    fn request_body_uses_camel_case_cache_field() {
        let request = build_request("Where is the fuse?", Some("cachedContents/m1"));
        let body = serde_json::to_value(request).unwrap();

        assert_eq!(body["cachedContent"], "cachedContents/m1");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Where is the fuse?");
    }

    #[test]
    fn request_body_omits_missing_cache() {
        let body = serde_json::to_value(build_request("q", None)).unwrap();
        assert!(body.get("cachedContent").is_none());
    }

    #[test]
    fn extract_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "<final-answer>"}, {"text": "Yes</final-answer>"}]}, "finishReason": "STOP"}]}"#,
        )
        .unwrap();

        assert_eq!(
            extract_text(response).unwrap(),
            "<final-answer>Yes</final-answer>"
        );
    }

    #[test]
    fn extract_text_without_candidates_is_api_error() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(extract_text(response), Err(ModelError::Api { .. })));
    }

    #[test]
    fn extract_text_reports_finish_reason() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();

        let err = extract_text(response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn retry_succeeds_after_transient_error() {
        let attempts = AtomicUsize::new(0);

        let result = retry_with_delays(&NO_DELAYS, || {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(network_error())
            } else {
                Ok("success")
            }
        });

        assert_eq!(result.unwrap(), "success");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn retry_stops_after_all_delays() {
        let attempts = AtomicUsize::new(0);

        let result: Result<(), ModelError> = retry_with_delays(&NO_DELAYS, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(ModelError::Http {
                status: 503,
                body: String::new(),
            })
        });

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn client_errors_are_not_retried() {
        let attempts = AtomicUsize::new(0);

        let result: Result<(), ModelError> = retry_with_delays(&NO_DELAYS, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(ModelError::Http {
                status: 400,
                body: String::new(),
            })
        });

        assert!(matches!(result, Err(ModelError::Http { status: 400, .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn should_retry_classification() {
        assert!(should_retry(&network_error()));
        assert!(should_retry(&ModelError::Http {
            status: 429,
            body: String::new()
        }));
        assert!(!should_retry(&ModelError::Http {
            status: 404,
            body: String::new()
        }));
        assert!(!should_retry(&ModelError::MissingApiKey));
        assert!(!should_retry(&ModelError::Api {
            message: "empty".to_string()
        }));
    }
}
