//! Request and response bodies of the operator API
//!
//! `POST /sync-jobs` takes the same shape the upstream dashboard publishes:
//!
//! ```json
//! { "channelId": "chan-1", "integrationId": "integ-1", "folderId": "1AbC..." }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::proto::DeadLetterJob;

/// Missing fields deserialize as empty and are rejected by validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncJobRequest {
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub integration_id: String,
    #[serde(default)]
    pub folder_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncJobAccepted {
    pub seq: u64,
    pub trace_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct DeadLetterQuery {
    #[serde(default = "default_dlq_limit")]
    pub limit: usize,
}

fn default_dlq_limit() -> usize {
    100
}

/// Operator view of one dead-lettered job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetterView {
    pub seq: u64,
    pub channel_id: String,
    pub integration_id: String,
    pub folder_id: String,
    pub trace_id: String,
    pub failure_code: String,
    pub failure_message: String,
    pub attempts: u32,
    pub failed_at: Option<DateTime<Utc>>,
}

impl DeadLetterView {
    pub fn new(seq: u64, entry: DeadLetterJob) -> Self {
        let job = entry.job.unwrap_or_default();
        Self {
            seq,
            channel_id: job.channel_id,
            integration_id: job.integration_id,
            folder_id: job.folder_id,
            trace_id: job.trace_id,
            failure_code: entry.failure_code,
            failure_message: entry.failure_message,
            attempts: entry.attempts,
            failed_at: i64::try_from(entry.failed_at_ms)
                .ok()
                .and_then(DateTime::from_timestamp_millis),
        }
    }
}
