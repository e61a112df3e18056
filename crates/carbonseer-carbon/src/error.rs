//! Provider error types.
//!
//! These never leave a provider's `fetch`: they are logged and collapsed
//! into "no value" so the resolver can move on to the next source.

use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider is missing {0}")]
    NotConfigured(&'static str),

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("no intensity field in response")]
    MissingField,

    #[error("intensity field is not a finite number: {0}")]
    InvalidValue(String),
}
