use std::time::Duration;

use prgate_core::GateError;

use crate::prompt::{self, ReviewPrompt, ReviewResult};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

/// Adapter for the Anthropic messages API.
///
/// Requests free-form text and locates the JSON review object inside it.
#[derive(Debug)]
pub struct ClaudeAdapter {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl ClaudeAdapter {
    /// Create an adapter with the given credentials and model.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Llm`] if the HTTP client cannot be built.
    pub fn new(api_key: String, model: String) -> Result<Self, GateError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| GateError::Llm(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_key,
            model,
        })
    }

    /// Run a review and normalize the response.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Llm`] on transport or API errors, or
    /// [`GateError::Parse`] when the response holds no valid review.
    pub async fn review(&self, prompt: &ReviewPrompt) -> Result<ReviewResult, GateError> {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "system": prompt::build_system_prompt(&prompt.rules),
            "messages": [
                { "role": "user", "content": prompt::build_user_prompt(prompt) }
            ],
        });

        let response = self
            .http
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| GateError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(GateError::Llm(format!("API error {status}: {body_text}")));
        }

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GateError::Llm(format!("failed to read response: {e}")))?;

        let text = response_body
            .get("content")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("text"))
            .and_then(|t| t.as_str())
            .ok_or_else(|| {
                GateError::Llm(format!("unexpected response structure: {response_body}"))
            })?;

        prompt::parse_review_response("claude", text)
    }
}
