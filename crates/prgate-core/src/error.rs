/// Errors that can occur across the prgate crates.
///
/// Each variant wraps a specific failure domain. Library crates use this type
/// directly; the binary crate converts to `miette` diagnostics at the boundary.
///
/// # Examples
///
/// ```
/// use prgate_core::GateError;
///
/// let err = GateError::Config("unknown provider: foo".into());
/// assert!(err.to_string().contains("unknown provider"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration, including missing credentials
    /// and unrecognized provider names.
    #[error("configuration error: {0}")]
    Config(String),

    /// A source-control service call failed. Fatal to the run and never
    /// retried by the libraries.
    #[error("upstream fetch error: {0}")]
    Fetch(String),

    /// LLM transport or API failure.
    #[error("LLM error: {0}")]
    Llm(String),

    /// The LLM response did not contain a parseable review. Carries the
    /// raw response text for diagnostics.
    #[error("{provider}: failed to parse review response: {detail}")]
    Parse {
        /// Provider that produced the unparseable response.
        provider: String,
        /// What went wrong while parsing.
        detail: String,
        /// The raw response text, verbatim.
        raw: String,
    },

    /// A single comment failed to post. Recovered locally by the
    /// orchestrator; never escalated to run failure.
    #[error("comment post failed: {0}")]
    Post(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: GateError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = GateError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn parse_error_names_provider_and_keeps_raw() {
        let err = GateError::Parse {
            provider: "claude".into(),
            detail: "no JSON object found".into(),
            raw: "I cannot review this.".into(),
        };
        assert!(err.to_string().contains("claude"));
        match err {
            GateError::Parse { raw, .. } => assert_eq!(raw, "I cannot review this."),
            _ => unreachable!(),
        }
    }
}
