use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GateError;

/// Top-level configuration loaded from `.prgate.toml`.
///
/// Supports layered resolution: CLI flags > env vars > config file >
/// defaults. The file only ever supplies defaults; credentials are read
/// from the environment at run time.
///
/// # Examples
///
/// ```
/// use prgate_core::GateConfig;
///
/// let config = GateConfig::default();
/// assert_eq!(config.ado.pat_env, "AZURE_DEVOPS_PAT");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateConfig {
    /// Azure DevOps connection settings.
    #[serde(default)]
    pub ado: AdoConfig,
    /// LLM provider settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Review rules file locations.
    #[serde(default)]
    pub rules: RulesConfig,
}

impl GateConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Io`] if the file cannot be read, or
    /// [`GateError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, GateError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use prgate_core::GateConfig;
    ///
    /// let toml = r#"
    /// [ado]
    /// organization = "contoso"
    /// "#;
    /// let config = GateConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.ado.organization.as_deref(), Some("contoso"));
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, GateError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Azure DevOps connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdoConfig {
    /// Organization name (forms `https://dev.azure.com/{organization}`).
    pub organization: Option<String>,
    /// Project name within the organization.
    pub project: Option<String>,
    /// Default repository name or id (falls back to the project name).
    pub repository: Option<String>,
    /// Environment variable holding the personal access token.
    #[serde(default = "default_pat_env")]
    pub pat_env: String,
}

fn default_pat_env() -> String {
    "AZURE_DEVOPS_PAT".into()
}

impl Default for AdoConfig {
    fn default() -> Self {
        Self {
            organization: None,
            project: None,
            repository: None,
            pat_env: default_pat_env(),
        }
    }
}

/// The closed set of supported LLM backends.
///
/// Selection is a pure discriminated dispatch; an unrecognized provider
/// string is a configuration error, never a runtime fallback.
///
/// # Examples
///
/// ```
/// use prgate_core::Provider;
///
/// let p: Provider = "azure-openai".parse().unwrap();
/// assert_eq!(p, Provider::AzureOpenAi);
/// assert!("mistral".parse::<Provider>().is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    /// Anthropic messages API.
    #[default]
    #[serde(rename = "claude")]
    Claude,
    /// OpenAI chat completions API.
    #[serde(rename = "openai")]
    OpenAi,
    /// Azure-hosted OpenAI deployment.
    #[serde(rename = "azure-openai")]
    AzureOpenAi,
}

impl Provider {
    /// Default model identifier for this provider.
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Claude => "claude-sonnet-4-20250514",
            Provider::OpenAi | Provider::AzureOpenAi => "gpt-4o",
        }
    }

    /// Environment variable consulted for this provider's API key.
    pub fn api_key_env(self) -> &'static str {
        match self {
            Provider::Claude => "ANTHROPIC_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::AzureOpenAi => "AZURE_OPENAI_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Claude => write!(f, "claude"),
            Provider::OpenAi => write!(f, "openai"),
            Provider::AzureOpenAi => write!(f, "azure-openai"),
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "claude" => Ok(Provider::Claude),
            "openai" => Ok(Provider::OpenAi),
            "azure-openai" => Ok(Provider::AzureOpenAi),
            other => Err(format!("unknown LLM provider: {other}")),
        }
    }
}

/// LLM provider configuration.
///
/// # Examples
///
/// ```
/// use prgate_core::{LlmConfig, Provider};
///
/// let config = LlmConfig::default();
/// assert_eq!(config.provider, Provider::Claude);
/// assert_eq!(config.resolved_model(), "claude-sonnet-4-20250514");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Backend to use.
    #[serde(default)]
    pub provider: Provider,
    /// Model identifier; defaults per provider when unset.
    pub model: Option<String>,
    /// API key; the provider's env var takes precedence.
    pub api_key: Option<String>,
    /// Endpoint URL, required for `azure-openai` (also read from
    /// `AZURE_OPENAI_ENDPOINT`).
    pub endpoint: Option<String>,
}

impl LlmConfig {
    /// The model to use: the configured one, or the provider default.
    pub fn resolved_model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }

    /// Resolve the API key: provider env var first, then the config file.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Config`] when neither source yields a
    /// non-empty key.
    pub fn resolved_api_key(&self) -> Result<String, GateError> {
        let env_var = self.provider.api_key_env();
        if let Ok(key) = std::env::var(env_var) {
            if !key.is_empty() {
                return Ok(key);
            }
        }
        match &self.api_key {
            Some(key) if !key.is_empty() => Ok(key.clone()),
            _ => Err(GateError::Config(format!(
                "no API key for provider '{}': set {env_var} or llm.api_key",
                self.provider
            ))),
        }
    }

    /// Resolve the endpoint: `AZURE_OPENAI_ENDPOINT` first, then the
    /// config file.
    pub fn resolved_endpoint(&self) -> Option<String> {
        std::env::var("AZURE_OPENAI_ENDPOINT")
            .ok()
            .filter(|e| !e.is_empty())
            .or_else(|| self.endpoint.clone())
    }
}

/// Review rules file locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Path to the review rules markdown.
    pub path: Option<PathBuf>,
    /// Path to an optional clean-code style guide.
    pub style_guide: Option<PathBuf>,
}
