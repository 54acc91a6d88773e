use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::Result;
use super::models::{IntegrationRecord, MediaEntry};

/// Media catalog seam used by the import engine
///
/// Implementations must enforce at most one entry per
/// `(channel_id, storage_file_id)` and report a violation as
/// [`CatalogError::Duplicate`](super::CatalogError::Duplicate), including
/// when two writers race on the same key.
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    /// Whether an entry exists for this channel and remote file
    async fn contains(&self, channel_id: &str, storage_file_id: &str) -> Result<bool>;

    /// Persist a new entry
    async fn insert(&self, entry: MediaEntry) -> Result<()>;

    /// All entries of one channel
    async fn list_channel(&self, channel_id: &str) -> Result<Vec<MediaEntry>>;
}

/// Integration records as seen by this worker: read, and stamp last sync
#[async_trait]
pub trait IntegrationStore: Send + Sync {
    async fn get_integration(&self, integration_id: &str) -> Result<Option<IntegrationRecord>>;

    async fn touch_last_sync(&self, integration_id: &str, at: DateTime<Utc>) -> Result<()>;
}
