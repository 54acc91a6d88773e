//! Worker counters, exposed on the operator `/metrics` endpoint

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::sync::ImportSummary;

/// Process-wide counters for sync jobs and imported files
#[derive(Debug, Default)]
pub struct Metrics {
    jobs_accepted: AtomicU64,
    jobs_completed: AtomicU64,
    jobs_retried: AtomicU64,
    jobs_dead_lettered: AtomicU64,
    files_imported: AtomicU64,
    files_skipped: AtomicU64,
    files_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_accepted(&self) {
        self.jobs_accepted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "jobs_accepted", "Metric incremented");
    }

    pub fn job_completed(&self, summary: &ImportSummary) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
        self.files_imported
            .fetch_add(summary.imported as u64, Ordering::Relaxed);
        self.files_skipped
            .fetch_add(summary.skipped as u64, Ordering::Relaxed);
        self.files_failed
            .fetch_add(summary.failed as u64, Ordering::Relaxed);
        tracing::debug!(counter = "jobs_completed", "Metric incremented");
    }

    pub fn job_retried(&self) {
        self.jobs_retried.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "jobs_retried", "Metric incremented");
    }

    pub fn job_dead_lettered(&self) {
        self.jobs_dead_lettered.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "jobs_dead_lettered", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            jobs_accepted: self.jobs_accepted.load(Ordering::Relaxed),
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            jobs_retried: self.jobs_retried.load(Ordering::Relaxed),
            jobs_dead_lettered: self.jobs_dead_lettered.load(Ordering::Relaxed),
            files_imported: self.files_imported.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub jobs_accepted: u64,
    pub jobs_completed: u64,
    pub jobs_retried: u64,
    pub jobs_dead_lettered: u64,
    pub files_imported: u64,
    pub files_skipped: u64,
    pub files_failed: u64,
}
