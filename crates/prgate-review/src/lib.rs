//! LLM-backed review pipeline for prgate.
//!
//! Provides prompt construction and response parsing ([`prompt`]), the
//! provider adapters ([`llm`]), rules and style-guide loading
//! ([`rules`]), and the end-to-end orchestrator ([`reviewer`]).

pub mod llm;
pub mod prompt;
pub mod reviewer;
pub mod rules;
