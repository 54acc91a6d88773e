use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Duplicate entry for channel {channel_id}, storage file {storage_file_id}")]
    Duplicate {
        channel_id: String,
        storage_file_id: String,
    },

    #[error("Integration not found: {0}")]
    IntegrationNotFound(String),

    #[error("Catalog lock poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
