//! Core types, configuration, and error handling for prgate.
//!
//! This crate provides the shared foundation used by the other prgate
//! crates:
//! - [`GateError`] — unified error type using `thiserror`
//! - [`GateConfig`] — configuration loaded from `.prgate.toml`
//! - Shared types: [`PullRequestInfo`], [`FileChange`], [`FileDiff`],
//!   [`PullRequestDiff`], [`ReviewIssue`], [`Severity`]

mod config;
mod error;
mod types;

pub use config::{AdoConfig, GateConfig, LlmConfig, Provider, RulesConfig};
pub use error::GateError;
pub use types::{
    ChangeKind, FileChange, FileDiff, PullRequestDiff, PullRequestInfo, ReviewIssue, Severity,
};

/// A convenience `Result` type for prgate operations.
pub type Result<T> = std::result::Result<T, GateError>;
