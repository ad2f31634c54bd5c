use std::time::Duration;

use prgate_core::GateError;

use crate::prompt::{self, ReviewPrompt, ReviewResult};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Adapter for the OpenAI chat completions API.
///
/// Requests a JSON-constrained response via `response_format`.
#[derive(Debug)]
pub struct OpenAiAdapter {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiAdapter {
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
        let body = chat_completion_body(&self.model, prompt);

        let response = self
            .http
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GateError::Llm(format!("request failed: {e}")))?;

        let text = extract_chat_content(response).await?;
        prompt::parse_review_response("openai", &text)
    }
}

/// Request body shared by the OpenAI and Azure OpenAI adapters.
pub(super) fn chat_completion_body(model: &str, prompt: &ReviewPrompt) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "messages": [
            { "role": "system", "content": prompt::build_system_prompt(&prompt.rules) },
            { "role": "user", "content": prompt::build_user_prompt(prompt) }
        ],
        "response_format": { "type": "json_object" },
    })
}

/// Extract `choices[0].message.content` from a chat-completions response.
pub(super) async fn extract_chat_content(
    response: reqwest::Response,
) -> Result<String, GateError> {
    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        return Err(GateError::Llm(format!("API error {status}: {body_text}")));
    }

    let response_body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| GateError::Llm(format!("failed to read response: {e}")))?;

    response_body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| GateError::Llm(format!("unexpected response structure: {response_body}")))
}
