//! The pluggable LLM backend, one adapter per provider.
//!
//! The provider set is closed and enumerable, so dispatch is a tagged
//! union over the three adapters rather than an open trait object.

mod azure;
mod claude;
mod openai;

pub use azure::AzureOpenAiAdapter;
pub use claude::ClaudeAdapter;
pub use openai::OpenAiAdapter;

use prgate_core::{GateError, LlmConfig, Provider};

use crate::prompt::{ReviewPrompt, ReviewResult};

/// A configured review backend.
///
/// # Examples
///
/// ```
/// use prgate_core::{LlmConfig, Provider};
/// use prgate_review::llm::LlmAdapter;
///
/// let config = LlmConfig {
///     provider: Provider::OpenAi,
///     api_key: Some("test-key".into()),
///     ..LlmConfig::default()
/// };
/// let adapter = LlmAdapter::from_config(&config).unwrap();
/// assert_eq!(adapter.provider(), Provider::OpenAi);
/// ```
#[derive(Debug)]
pub enum LlmAdapter {
    /// Anthropic messages API.
    Claude(ClaudeAdapter),
    /// OpenAI chat completions API.
    OpenAi(OpenAiAdapter),
    /// Azure-hosted OpenAI deployment.
    AzureOpenAi(AzureOpenAiAdapter),
}

impl LlmAdapter {
    /// Build the adapter selected by the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Config`] when no API key can be resolved, or
    /// when the `azure-openai` provider is selected without an endpoint.
    pub fn from_config(config: &LlmConfig) -> Result<Self, GateError> {
        let api_key = config.resolved_api_key()?;
        let model = config.resolved_model();

        match config.provider {
            Provider::Claude => Ok(Self::Claude(ClaudeAdapter::new(api_key, model)?)),
            Provider::OpenAi => Ok(Self::OpenAi(OpenAiAdapter::new(api_key, model)?)),
            Provider::AzureOpenAi => {
                let endpoint = config.resolved_endpoint().ok_or_else(|| {
                    GateError::Config(
                        "azure-openai requires an endpoint: \
                         set AZURE_OPENAI_ENDPOINT or llm.endpoint"
                            .into(),
                    )
                })?;
                Ok(Self::AzureOpenAi(AzureOpenAiAdapter::new(
                    api_key, model, endpoint,
                )?))
            }
        }
    }

    /// The provider this adapter talks to.
    pub fn provider(&self) -> Provider {
        match self {
            LlmAdapter::Claude(_) => Provider::Claude,
            LlmAdapter::OpenAi(_) => Provider::OpenAi,
            LlmAdapter::AzureOpenAi(_) => Provider::AzureOpenAi,
        }
    }

    /// Submit the prompt to the selected backend and normalize its
    /// response into a [`ReviewResult`].
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Llm`] on transport failures and
    /// [`GateError::Parse`] when the response holds no valid review.
    pub async fn review(&self, prompt: &ReviewPrompt) -> Result<ReviewResult, GateError> {
        match self {
            LlmAdapter::Claude(adapter) => adapter.review(prompt).await,
            LlmAdapter::OpenAi(adapter) => adapter.review(prompt).await,
            LlmAdapter::AzureOpenAi(adapter) => adapter.review(prompt).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(provider: Provider) -> LlmConfig {
        LlmConfig {
            provider,
            model: None,
            api_key: Some("test-key".into()),
            endpoint: Some("https://contoso.openai.azure.com".into()),
        }
    }

    #[test]
    fn dispatch_selects_exactly_the_requested_adapter() {
        let adapter = LlmAdapter::from_config(&config_for(Provider::OpenAi)).unwrap();
        assert!(matches!(adapter, LlmAdapter::OpenAi(_)));
        assert_eq!(adapter.provider(), Provider::OpenAi);

        let adapter = LlmAdapter::from_config(&config_for(Provider::Claude)).unwrap();
        assert!(matches!(adapter, LlmAdapter::Claude(_)));

        let adapter = LlmAdapter::from_config(&config_for(Provider::AzureOpenAi)).unwrap();
        assert!(matches!(adapter, LlmAdapter::AzureOpenAi(_)));
    }

    #[test]
    fn azure_without_endpoint_is_a_config_error() {
        let config = LlmConfig {
            provider: Provider::AzureOpenAi,
            model: None,
            api_key: Some("test-key".into()),
            endpoint: None,
        };
        // Only meaningful when AZURE_OPENAI_ENDPOINT is not set in the
        // test environment.
        if std::env::var("AZURE_OPENAI_ENDPOINT").is_err() {
            let err = LlmAdapter::from_config(&config).unwrap_err();
            assert!(matches!(err, GateError::Config(_)));
        }
    }
}
