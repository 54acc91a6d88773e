//! Sync job processing
//!
//! A [`SyncPipeline`] runs one job end to end. The [`ImportEngine`] holds the
//! dedup rule: at most one catalog entry per channel and remote file, no
//! matter how often a job is delivered.

mod engine;
mod error;
mod pipeline;

pub use engine::{FailurePolicy, ImportEngine, ImportSummary};
pub use error::{Result, SyncError};
pub use pipeline::SyncPipeline;
