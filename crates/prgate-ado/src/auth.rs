use prgate_core::GateError;

/// Supplies a personal access token read from an environment variable.
///
/// # Examples
///
/// ```
/// use prgate_ado::auth::PatAuthenticator;
///
/// let auth = PatAuthenticator::default();
/// assert_eq!(auth.env_var(), "AZURE_DEVOPS_PAT");
/// ```
#[derive(Debug, Clone)]
pub struct PatAuthenticator {
    env_var: String,
}

impl PatAuthenticator {
    /// Create an authenticator backed by the named environment variable.
    pub fn new(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
        }
    }

    /// The environment variable this authenticator reads.
    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// Read the token.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Config`] when the variable is unset or empty.
    pub fn token(&self) -> Result<String, GateError> {
        match std::env::var(&self.env_var) {
            Ok(token) if !token.is_empty() => Ok(token),
            _ => Err(GateError::Config(format!(
                "environment variable '{}' is not set or empty; \
                 set it to a valid Azure DevOps personal access token",
                self.env_var
            ))),
        }
    }
}

impl Default for PatAuthenticator {
    fn default() -> Self {
        Self::new("AZURE_DEVOPS_PAT")
    }
}
