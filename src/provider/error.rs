use thiserror::Error;

/// Errors from the storage provider's HTTP API
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider refused our credentials (revoked consent, invalid grant,
    /// expired or under-scoped token)
    #[error("provider rejected credentials (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request names something that does not exist or is malformed
    #[error("provider rejected request (HTTP {status}): {message}")]
    InvalidRequest { status: u16, message: String },

    /// Network failure, rate limiting, or a provider-side 5xx
    #[error("provider unavailable: {message}")]
    Unavailable { status: Option<u16>, message: String },

    /// The provider answered with a body we could not decode
    #[error("unexpected provider response: {0}")]
    Decode(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

impl ProviderError {
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ProviderError::Decode(e.to_string())
        } else {
            ProviderError::Unavailable {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            }
        }
    }
}
