use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::classify::MediaKind;

/// Where a catalog entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaSource {
    Upload,
    Sync,
}

/// One asset in the media catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaEntry {
    pub id: Uuid,
    pub channel_id: String,
    pub original_name: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
    #[serde(rename = "type")]
    pub media_type: MediaKind,
    pub mime_type: String,
    pub file_size: Option<u64>,
    pub source: MediaSource,
    /// Remote file id; unique per channel when present
    pub storage_file_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A channel's stored link to an external storage account
///
/// Secrets live encrypted inside `config`; see [`IntegrationRecord::CLIENT_ID`]
/// and friends for the keys this worker reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationRecord {
    pub id: String,
    pub channel_id: String,
    pub provider: String,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl IntegrationRecord {
    pub const CLIENT_ID: &'static str = "clientId";
    pub const ENCRYPTED_REFRESH_TOKEN: &'static str = "encryptedRefreshToken";
    pub const ENCRYPTED_CLIENT_SECRET: &'static str = "encryptedClientSecret";

    /// Non-empty string value of a config key
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }
}
