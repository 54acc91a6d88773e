use thiserror::Error;

use crate::catalog::CatalogError;
use crate::provider::ProviderError;

/// Why a sync job failed
#[derive(Debug, Error)]
pub enum SyncError {
    /// Integration missing or incomplete, secrets undecryptable, or the job
    /// names a folder the provider does not know. Retrying will not help.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The provider rejected the integration's credentials; a human has to
    /// re-authorize it.
    #[error("authorization error: {0}")]
    Auth(String),

    /// Network failure, rate limiting, or a provider-side 5xx.
    #[error("transient provider error: {0}")]
    TransientProvider(String),

    /// A catalog write failed and the failure policy aborts the job.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The catalog or integration store could not be read.
    #[error("store error: {0}")]
    Store(#[from] CatalogError),
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Stable code for logs and dead-letter records
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Configuration(_) => "CONFIGURATION_ERROR",
            SyncError::Auth(_) => "AUTH_ERROR",
            SyncError::TransientProvider(_) => "TRANSIENT_PROVIDER_ERROR",
            SyncError::Persistence(_) => "PERSISTENCE_ERROR",
            SyncError::Store(_) => "STORE_ERROR",
        }
    }

    /// Whether running the whole job again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::TransientProvider(_) | SyncError::Store(_))
    }
}

impl From<ProviderError> for SyncError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Rejected { .. } => SyncError::Auth(err.to_string()),
            ProviderError::InvalidRequest { .. } | ProviderError::Client(_) => {
                SyncError::Configuration(err.to_string())
            }
            ProviderError::Unavailable { .. } | ProviderError::Decode(_) => {
                SyncError::TransientProvider(err.to_string())
            }
        }
    }
}
