//! Provider error types.

use thiserror::Error;

/// Errors that can occur when talking to an external collaborator or
/// loading one of its data files.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The service answered with a body we could not understand.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A data file could not be read or parsed.
    #[error("data file {path}: {message}")]
    DataFile { path: String, message: String },

    /// The configuration is incomplete or inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ProviderError {
    pub(crate) fn from_reqwest(e: reqwest::Error, timeout_secs: u64, service: &str, url: &str) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout(timeout_secs)
        } else if e.is_connect() {
            ProviderError::NetworkError(format!("{service} not reachable at {url}"))
        } else {
            ProviderError::NetworkError(e.to_string())
        }
    }
}
