use crate::proto::{DeadLetterJob, SyncJob};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use prost::Message;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("Protobuf decode error: {0}")]
    ProtobufDecode(#[from] prost::DecodeError),

    #[error("Job not found: seq={0}")]
    JobNotFound(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, QueueError>;

/// FjallQueue persists sync jobs and the dead-letter queue
///
/// Partitions:
/// - `jobs`: u64 (big-endian) → SyncJob (protobuf), pending until acked
/// - `metadata`: "next_seq" → u64
/// - `dlq`: u64 (big-endian) → DeadLetterJob (protobuf)
///
/// A job stays in `jobs` until it is acked or dead-lettered, so a process
/// restart redelivers everything that was in flight.
pub struct FjallQueue {
    keyspace: Keyspace,
    jobs: PartitionHandle,
    metadata: PartitionHandle,
    dlq: PartitionHandle,
    seq_counter: Arc<AtomicU64>,
}

impl FjallQueue {
    /// Open or create a FjallQueue at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening FjallQueue at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;

        let jobs = keyspace.open_partition("jobs", PartitionCreateOptions::default())?;
        let metadata = keyspace.open_partition("metadata", PartitionCreateOptions::default())?;
        let dlq = keyspace.open_partition("dlq", PartitionCreateOptions::default())?;

        let current_seq = metadata
            .get(b"next_seq")?
            .map(|bytes| decode_seq(bytes.as_ref()))
            .unwrap_or(0);

        info!("FjallQueue opened, current sequence: {}", current_seq);

        Ok(Self {
            keyspace,
            jobs,
            metadata,
            dlq,
            seq_counter: Arc::new(AtomicU64::new(current_seq)),
        })
    }

    /// Persist a job and return its sequence number
    pub fn enqueue(&self, job: &SyncJob) -> Result<u64> {
        let seq = self.seq_counter.fetch_add(1, Ordering::SeqCst);

        self.jobs.insert(seq.to_be_bytes(), job.encode_to_vec())?;
        self.metadata.insert(b"next_seq", (seq + 1).to_be_bytes())?;

        debug!(seq, channel_id = %job.channel_id, "Job enqueued");

        Ok(seq)
    }

    /// Retrieve a pending job by sequence number
    pub fn get_job(&self, seq: u64) -> Result<Option<SyncJob>> {
        match self.jobs.get(seq.to_be_bytes())? {
            Some(bytes) => Ok(Some(SyncJob::decode(&*bytes)?)),
            None => Ok(None),
        }
    }

    /// Overwrite a pending job, e.g. to bump its attempt before redelivery
    pub fn reschedule(&self, seq: u64, job: &SyncJob) -> Result<()> {
        if !self.jobs.contains_key(seq.to_be_bytes())? {
            return Err(QueueError::JobNotFound(seq));
        }
        self.jobs.insert(seq.to_be_bytes(), job.encode_to_vec())?;
        debug!(seq, attempt = job.attempt, "Job rescheduled");
        Ok(())
    }

    /// Remove a completed job
    pub fn ack(&self, seq: u64) -> Result<()> {
        self.jobs.remove(seq.to_be_bytes())?;
        debug!(seq, "Job acked");
        Ok(())
    }

    /// All jobs not yet acked or dead-lettered, in sequence order
    pub fn pending(&self) -> Result<Vec<(u64, SyncJob)>> {
        let mut results = Vec::new();

        for item in self.jobs.iter() {
            let (key, value) = item?;
            results.push((decode_seq(key.as_ref()), SyncJob::decode(&*value)?));
        }

        Ok(results)
    }

    /// Move a job to the Dead Letter Queue (DLQ)
    ///
    /// Called when a job fails permanently or exhausts its retries. The job
    /// leaves the pending set.
    pub fn move_to_dlq(
        &self,
        seq: u64,
        failure_code: String,
        failure_message: String,
        attempts: u32,
    ) -> Result<()> {
        let job = self.get_job(seq)?.ok_or(QueueError::JobNotFound(seq))?;

        let entry = DeadLetterJob {
            job: Some(job),
            failure_code,
            failure_message,
            attempts,
            failed_at_ms: now_ms(),
        };

        self.dlq.insert(seq.to_be_bytes(), entry.encode_to_vec())?;
        self.jobs.remove(seq.to_be_bytes())?;

        info!(seq, attempts, "Job moved to DLQ");

        Ok(())
    }

    /// Get a job from the DLQ by sequence number
    pub fn get_dlq_job(&self, seq: u64) -> Result<Option<DeadLetterJob>> {
        match self.dlq.get(seq.to_be_bytes())? {
            Some(bytes) => Ok(Some(DeadLetterJob::decode(&*bytes)?)),
            None => Ok(None),
        }
    }

    /// List DLQ entries (for inspection)
    pub fn list_dlq(&self, limit: usize) -> Result<Vec<(u64, DeadLetterJob)>> {
        let mut results = Vec::new();

        for item in self.dlq.iter().take(limit) {
            let (key, value) = item?;
            results.push((decode_seq(key.as_ref()), DeadLetterJob::decode(&*value)?));
        }

        Ok(results)
    }

    /// Flush all writes to disk
    pub fn flush(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }

    /// Verify the database is readable
    pub fn health_check(&self) -> Result<()> {
        let _ = self.metadata.get(b"next_seq")?;
        Ok(())
    }
}

fn decode_seq(bytes: &[u8]) -> u64 {
    u64::from_be_bytes(bytes.try_into().unwrap_or([0u8; 8]))
}

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
