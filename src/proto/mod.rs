//! Protobuf messages carried on the local sync queue
//!
//! - `SyncJob` - one request to reconcile a storage folder into the catalog
//! - `DeadLetterJob` - a job that failed permanently or exhausted retries
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mediasync::proto::SyncJob;
//! use prost::Message;
//!
//! let job = SyncJob::new("chan-1", "integ-1", "folder-1");
//! let bytes = job.encode_to_vec();
//! let decoded = SyncJob::decode(&bytes[..])?;
//! ```

use uuid::Uuid;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SyncJob {
    #[prost(string, tag = "1")]
    pub channel_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub integration_id: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub folder_id: ::prost::alloc::string::String,
    /// Delivery attempt, starting at 1
    #[prost(uint32, tag = "4")]
    pub attempt: u32,
    #[prost(string, tag = "5")]
    pub trace_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeadLetterJob {
    #[prost(message, optional, tag = "1")]
    pub job: ::core::option::Option<SyncJob>,
    #[prost(string, tag = "2")]
    pub failure_code: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub failure_message: ::prost::alloc::string::String,
    #[prost(uint32, tag = "4")]
    pub attempts: u32,
    #[prost(uint64, tag = "5")]
    pub failed_at_ms: u64,
}

impl SyncJob {
    /// First delivery of a job, with a fresh trace id
    pub fn new(
        channel_id: impl Into<String>,
        integration_id: impl Into<String>,
        folder_id: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            integration_id: integration_id.into(),
            folder_id: folder_id.into(),
            attempt: 1,
            trace_id: Uuid::now_v7().to_string(),
        }
    }
}
