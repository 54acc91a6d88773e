use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::error::{Result, SyncError};
use crate::catalog::{CatalogError, MediaCatalog, MediaEntry, MediaSource};
use crate::classify::{Classification, MediaKind, classify};
use crate::provider::{RemoteFile, content_url};

/// What a failed catalog write does to the rest of the listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Count the file as failed and keep going
    #[default]
    Isolate,
    /// Stop and fail the whole job
    Abort,
}

/// Per-run import counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    /// Unsupported type, or already in the catalog
    pub skipped: usize,
    pub failed: usize,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.imported + self.skipped + self.failed
    }
}

/// Classifies a listing and writes what is new into the media catalog
pub struct ImportEngine {
    catalog: Arc<dyn MediaCatalog>,
    content_host: String,
    policy: FailurePolicy,
}

impl ImportEngine {
    pub fn new(
        catalog: Arc<dyn MediaCatalog>,
        content_host: impl Into<String>,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            catalog,
            content_host: content_host.into(),
            policy,
        }
    }

    /// Import every supported file not yet cataloged for `channel_id`
    ///
    /// Safe to run any number of times over the same listing: a file
    /// already present, or inserted concurrently by another run, is
    /// counted as skipped.
    pub async fn import(&self, channel_id: &str, files: &[RemoteFile]) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        for file in files {
            let kind = match classify(&file.mime_type) {
                Classification::Supported(kind) => kind,
                Classification::Unsupported => {
                    debug!(file_id = %file.id, mime_type = %file.mime_type, "Skipping unsupported file");
                    summary.skipped += 1;
                    continue;
                }
            };

            match self.catalog.contains(channel_id, &file.id).await {
                Ok(true) => {
                    debug!(file_id = %file.id, "Already imported");
                    summary.skipped += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    self.on_failure(file, e, &mut summary)?;
                    continue;
                }
            }

            let entry = self.entry_for(channel_id, file, kind);
            match self.catalog.insert(entry).await {
                Ok(()) => {
                    info!(
                        channel_id,
                        file_id = %file.id,
                        name = %file.name,
                        media_type = ?kind,
                        "Imported file"
                    );
                    summary.imported += 1;
                }
                Err(CatalogError::Duplicate { .. }) => {
                    debug!(file_id = %file.id, "Imported concurrently by another run");
                    summary.skipped += 1;
                }
                Err(e) => self.on_failure(file, e, &mut summary)?,
            }
        }

        Ok(summary)
    }

    fn on_failure(
        &self,
        file: &RemoteFile,
        err: CatalogError,
        summary: &mut ImportSummary,
    ) -> Result<()> {
        match self.policy {
            FailurePolicy::Isolate => {
                error!(file_id = %file.id, error = %err, "Failed to import file");
                summary.failed += 1;
                Ok(())
            }
            FailurePolicy::Abort => Err(SyncError::Persistence(format!(
                "importing {}: {}",
                file.id, err
            ))),
        }
    }

    fn entry_for(&self, channel_id: &str, file: &RemoteFile, kind: MediaKind) -> MediaEntry {
        MediaEntry {
            id: Uuid::now_v7(),
            channel_id: channel_id.to_string(),
            original_name: file.name.clone(),
            url: content_url(&self.content_host, &file.id),
            thumbnail_url: file.thumbnail_url.clone(),
            media_type: kind,
            mime_type: file.mime_type.clone(),
            file_size: parse_file_size(file.size.as_deref()),
            source: MediaSource::Sync,
            storage_file_id: Some(file.id.clone()),
            created_at: Utc::now(),
        }
    }
}

/// Provider sizes are decimal strings; anything else becomes `None`
fn parse_file_size(size: Option<&str>) -> Option<u64> {
    size.and_then(|s| s.trim().parse().ok())
}
