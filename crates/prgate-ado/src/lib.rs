//! Azure DevOps integration for prgate.
//!
//! Provides the service contract ([`service::GitService`]) and its REST
//! implementation ([`client::AdoClient`]), PAT authentication, positional
//! diff synthesis, pull-request diff aggregation, and comment posting.

pub mod auth;
pub mod client;
pub mod diff;
pub mod fetcher;
pub mod poster;
pub mod service;
