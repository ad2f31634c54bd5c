use std::time::Duration;

use prgate_core::GateError;

use crate::llm::openai::{chat_completion_body, extract_chat_content};
use crate::prompt::{self, ReviewPrompt, ReviewResult};

const API_VERSION: &str = "2024-06-01";

/// Adapter for an Azure-hosted OpenAI deployment.
///
/// Same request and response shapes as the OpenAI adapter, but addressed
/// to a deployment-scoped endpoint with `api-key` header auth.
#[derive(Debug)]
pub struct AzureOpenAiAdapter {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl AzureOpenAiAdapter {
    /// Create an adapter against `endpoint` (the resource base URL).
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Llm`] if the HTTP client cannot be built.
    pub fn new(api_key: String, model: String, endpoint: String) -> Result<Self, GateError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| GateError::Llm(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_key,
            model,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn deployment_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={API_VERSION}",
            self.endpoint, self.model
        )
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
            .post(self.deployment_url())
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GateError::Llm(format!("request failed: {e}")))?;

        let text = extract_chat_content(response).await?;
        prompt::parse_review_response("azure-openai", &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_url_targets_model_deployment() {
        let adapter = AzureOpenAiAdapter::new(
            "key".into(),
            "gpt-4o".into(),
            "https://contoso.openai.azure.com/".into(),
        )
        .unwrap();
        assert_eq!(
            adapter.deployment_url(),
            "https://contoso.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-06-01"
        );
    }
}
