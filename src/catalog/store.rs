use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use tracing::{debug, info};

use super::error::{CatalogError, Result};
use super::models::{IntegrationRecord, MediaEntry};
use super::partitions::{
    encode_index_key, encode_integration_key, encode_media_key, encode_media_prefix,
};
use super::traits::{IntegrationStore, MediaCatalog};

/// Fjall-backed catalog of media entries and integration records
///
/// `storage_index` is the uniqueness constraint on
/// `(channel_id, storage_file_id)`. Index check and entry write happen under
/// `write_lock` and land in one batch, so concurrent inserts of the same key
/// leave exactly one entry.
#[derive(Clone)]
pub struct FjallCatalog {
    keyspace: Keyspace,
    media: PartitionHandle,
    storage_index: PartitionHandle,
    integrations: PartitionHandle,
    write_lock: Arc<Mutex<()>>,
}

impl FjallCatalog {
    /// Open or create a catalog at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening Fjall catalog at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;

        let media = keyspace.open_partition("media", PartitionCreateOptions::default())?;
        let storage_index =
            keyspace.open_partition("storage_index", PartitionCreateOptions::default())?;
        let integrations =
            keyspace.open_partition("integrations", PartitionCreateOptions::default())?;

        info!("Fjall catalog opened successfully");
        Ok(Self {
            keyspace,
            media,
            storage_index,
            integrations,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Store or replace an integration record
    ///
    /// Integrations are owned by the dashboard; this exists for seeding and
    /// tests.
    pub fn put_integration(&self, record: &IntegrationRecord) -> Result<()> {
        let key = encode_integration_key(&record.id);
        self.integrations.insert(key, serde_json::to_vec(record)?)?;
        debug!(integration_id = %record.id, "Stored integration");
        Ok(())
    }

    fn read_integration(&self, integration_id: &str) -> Result<Option<IntegrationRecord>> {
        match self.integrations.get(encode_integration_key(integration_id))? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn insert_unique(&self, entry: &MediaEntry) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| CatalogError::LockPoisoned)?;

        let mut batch = self.keyspace.batch();

        if let Some(storage_file_id) = &entry.storage_file_id {
            let index_key = encode_index_key(&entry.channel_id, storage_file_id);
            if self.storage_index.contains_key(&index_key)? {
                return Err(CatalogError::Duplicate {
                    channel_id: entry.channel_id.clone(),
                    storage_file_id: storage_file_id.clone(),
                });
            }
            batch.insert(
                &self.storage_index,
                index_key,
                entry.id.to_string().into_bytes(),
            );
        }

        let media_key = encode_media_key(&entry.channel_id, &entry.id.to_string());
        batch.insert(&self.media, media_key, serde_json::to_vec(entry)?);
        batch.commit()?;

        Ok(())
    }

    /// Persist all pending writes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }

    /// Entry counts (for debugging/monitoring)
    pub fn stats(&self) -> Result<CatalogStats> {
        let mut media_count = 0;
        let mut integration_count = 0;

        for item in self.media.iter() {
            item?;
            media_count += 1;
        }

        for item in self.integrations.iter() {
            item?;
            integration_count += 1;
        }

        Ok(CatalogStats {
            media_count,
            integration_count,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CatalogStats {
    pub media_count: usize,
    pub integration_count: usize,
}

#[async_trait]
impl MediaCatalog for FjallCatalog {
    async fn contains(&self, channel_id: &str, storage_file_id: &str) -> Result<bool> {
        let key = encode_index_key(channel_id, storage_file_id);
        Ok(self.storage_index.contains_key(key)?)
    }

    async fn insert(&self, entry: MediaEntry) -> Result<()> {
        self.insert_unique(&entry)?;
        debug!(
            channel_id = %entry.channel_id,
            entry_id = %entry.id,
            "Inserted media entry"
        );
        Ok(())
    }

    async fn list_channel(&self, channel_id: &str) -> Result<Vec<MediaEntry>> {
        let mut entries = Vec::new();
        for item in self.media.prefix(encode_media_prefix(channel_id)) {
            let (_, value) = item?;
            entries.push(serde_json::from_slice(&value)?);
        }
        Ok(entries)
    }
}

#[async_trait]
impl IntegrationStore for FjallCatalog {
    async fn get_integration(&self, integration_id: &str) -> Result<Option<IntegrationRecord>> {
        self.read_integration(integration_id)
    }

    async fn touch_last_sync(&self, integration_id: &str, at: DateTime<Utc>) -> Result<()> {
        let mut record = self
            .read_integration(integration_id)?
            .ok_or_else(|| CatalogError::IntegrationNotFound(integration_id.to_string()))?;
        record.last_sync_at = Some(at);
        self.put_integration(&record)
    }
}
