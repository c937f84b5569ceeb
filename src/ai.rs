//! Remote generative-AI fallback.
//!
//! When the classifier is unsure (or absent), the message goes to the Gemini
//! `generateContent` REST API with a fixed system prompt scoping the
//! assistant to store topics. The public surface deliberately never fails:
//! any upstream problem is logged with its kind and folded into a fixed
//! apology, because the fallback path must not be able to take a request
//! down with it. Calls carry a client-level timeout and are retried once
//! after a short backoff.

use std::fmt;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{PalaverError, Result};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Model invoked for fallback answers.
pub const GEMINI_MODEL: &str = "models/gemini-2.0-flash";

/// Base URL of the generative-language API.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Deadline for one remote call, connection included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Pause before the single retry.
pub const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Instruction prepended to every fallback prompt.
pub const SYSTEM_PROMPT: &str = "You are an intelligent e-commerce customer support assistant named Chatbot. \
Only respond to questions related to orders, refunds, products, accounts, \
shipping, delivery, store policy, or customer support issues. \
If a user asks something unrelated (like jokes or trivia), \
politely redirect them to store-related help. \
Always be concise, friendly, and professional.";

/// Returned when the remote call cannot be completed.
pub const CONNECTION_APOLOGY: &str = "⚠️ Sorry, I’m having trouble connecting to the AI service.";

/// Returned when the model answers with no text at all.
pub const SCOPE_REDIRECT: &str =
    "I'm here to help with store-related questions like orders or refunds!";

/// Reduce a message to lowercase alphanumeric-or-whitespace characters.
///
/// This is the crude input filter applied before the text is embedded in the
/// prompt; it is not an encoding-safety guarantee.
pub fn sanitize_message(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}

/// Build the full prompt sent to the model.
pub fn build_prompt(message: &str) -> String {
    format!(
        "{SYSTEM_PROMPT}\n\nUser: {}\nChatbot:",
        sanitize_message(message)
    )
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Concatenated text of the first candidate, empty when there is none.
fn response_text(payload: GenerateContentResponse) -> String {
    payload
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

/// Client for the Gemini generative API.
///
/// Construction never fails; a client without an API key (or whose HTTP
/// stack failed to initialize) simply answers every call with the apology.
#[derive(Clone)]
pub struct GeminiClient {
    http: Option<reqwest::Client>,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

// Keeps the API key out of log output.
impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl GeminiClient {
    /// Create a client with the given API key, if any.
    pub fn new(api_key: Option<String>) -> Self {
        let http = match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("generative API client init failed: {e}");
                None
            }
        };
        if api_key.is_some() {
            info!("generative API fallback enabled ({GEMINI_MODEL})");
        } else {
            warn!("{API_KEY_ENV} is not set; fallback will always apologize");
        }
        GeminiClient {
            http,
            api_key,
            model: GEMINI_MODEL.to_string(),
            base_url: GEMINI_API_BASE.to_string(),
        }
    }

    /// Create a client from the process environment.
    pub fn from_env() -> Self {
        let key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());
        Self::new(key)
    }

    /// Override the model name.
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL.
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Answer a message, never failing.
    ///
    /// Upstream trouble of any kind becomes the fixed apology after being
    /// logged with its failure kind.
    pub async fn reply(&self, message: &str) -> String {
        match self.generate(message).await {
            Ok(text) => text,
            Err(err) => {
                let kind = match err {
                    PalaverError::UpstreamTimeout(_) => "timeout",
                    PalaverError::Config(_) => "not configured",
                    _ => "upstream",
                };
                warn!("generative fallback failed ({kind}): {err}");
                CONNECTION_APOLOGY.to_string()
            }
        }
    }

    /// Answer a message, surfacing failures to the caller.
    ///
    /// An empty model answer is a success and maps to the scope-redirect
    /// string, matching the behavior of the serving contract.
    pub async fn generate(&self, message: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| PalaverError::config(format!("{API_KEY_ENV} is not set")))?;
        let http = self
            .http
            .as_ref()
            .ok_or_else(|| PalaverError::upstream("HTTP client unavailable"))?;

        let prompt = build_prompt(message);
        let mut attempt = 0;
        loop {
            match self.request_once(http, api_key, &prompt).await {
                Ok(text) => {
                    let trimmed = text.trim();
                    return Ok(if trimmed.is_empty() {
                        SCOPE_REDIRECT.to_string()
                    } else {
                        trimmed.to_string()
                    });
                }
                Err(err) if attempt == 0 && err.is_upstream() => {
                    warn!(
                        "generative API attempt failed: {err}; retrying in {:?}",
                        RETRY_BACKOFF
                    );
                    attempt += 1;
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn request_once(
        &self,
        http: &reqwest::Client,
        api_key: &str,
        prompt: &str,
    ) -> Result<String> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = http
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let payload: GenerateContentResponse = response.json().await?;
        Ok(response_text(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_punctuation_and_lowercases() {
        assert_eq!(
            sanitize_message("  Where IS my order?! "),
            "where is my order"
        );
        assert_eq!(sanitize_message("order #123-456"), "order 123456");
        assert_eq!(sanitize_message("!!!"), "");
    }

    #[test]
    fn test_sanitize_keeps_inner_whitespace() {
        assert_eq!(sanitize_message("a  b\tc"), "a  b\tc");
    }

    #[test]
    fn test_build_prompt_shape() {
        let prompt = build_prompt("Where is my ORDER?");
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.contains("\n\nUser: where is my order\n"));
        assert!(prompt.ends_with("Chatbot:"));
    }

    #[test]
    fn test_response_text_extraction() {
        let payload: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"there"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response_text(payload), "Hello there");
    }

    #[test]
    fn test_response_text_empty_candidates() {
        let payload: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(response_text(payload), "");

        let payload: GenerateContentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(response_text(payload), "");
    }

    #[tokio::test]
    async fn test_reply_without_key_apologizes() {
        let client = GeminiClient::new(None);
        assert_eq!(client.reply("hello").await, CONNECTION_APOLOGY);
    }

    #[tokio::test]
    async fn test_generate_without_key_is_config_error() {
        let client = GeminiClient::new(None);
        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, PalaverError::Config(_)));
    }

    #[tokio::test]
    async fn test_reply_with_unreachable_endpoint_apologizes() {
        // Connection refused on both attempts; the caller still gets a string.
        let client = GeminiClient::new(Some("test-key".to_string()))
            .with_base_url("http://127.0.0.1:1");
        assert_eq!(client.reply("hello").await, CONNECTION_APOLOGY);
    }
}
