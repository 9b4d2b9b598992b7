//! HTTP error types

use capstan_resilience::Retryable;

/// Error type for outbound HTTP operations
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Service-unavailable class responses, retried with backoff
    #[error("Transient upstream error: HTTP {status}")]
    Transient { status: u16 },

    #[error("Unexpected status: HTTP {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// Token acquisition failed; the calling request is not sent
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl Retryable for HttpError {
    fn is_retryable(&self) -> bool {
        match self {
            HttpError::Transient { .. } => true,
            HttpError::Network(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
