//! Error types for the controller's external collaborators.
//!
//! The controller cycle is the only consumer; it decides per collaborator
//! whether an error degrades the cycle or aborts its patch step.

use thiserror::Error;

/// Failure to obtain a p95 latency reading.
#[derive(Debug, Error)]
pub enum LatencyError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("latency query request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("latency backend returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("latency query rejected: {0}")]
    Query(String),

    #[error("malformed latency response: {0}")]
    Malformed(String),

    #[error("latency query returned no data")]
    NoData,
}

/// Failure to read or patch the workload's replica count.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("orchestrator client configuration: {0}")]
    Config(String),

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("orchestrator request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("orchestrator returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed orchestrator response: {0}")]
    Malformed(String),
}
