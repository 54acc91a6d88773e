use crate::proto::SyncJob;
use crate::queue::store::{FjallQueue, QueueError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

pub type SharedQueue = Arc<RwLock<FjallQueue>>;

/// JobEnvelope wraps a SyncJob with its queue sequence number
#[derive(Clone, Debug)]
pub struct JobEnvelope {
    pub seq: u64,
    pub job: SyncJob,
}

/// JobBroker distributes sync jobs to the worker pool
///
/// 1. `enqueue` persists the job to FjallQueue and gets its seq
/// 2. The envelope is sent round-robin to one worker's bounded channel
/// 3. A full channel blocks the caller (backpressure)
///
/// Jobs stay persisted until the worker acks or dead-letters them, so a
/// closed channel never loses a job; `recover` redelivers it on next start.
pub struct JobBroker {
    queue: SharedQueue,
    worker_channels: Vec<mpsc::Sender<JobEnvelope>>,
    next_worker: AtomicUsize,
}

impl JobBroker {
    /// Create a broker plus one receiver per worker
    pub fn new(
        queue: SharedQueue,
        num_workers: usize,
        channel_size: usize,
    ) -> (Self, Vec<mpsc::Receiver<JobEnvelope>>) {
        info!(
            num_workers,
            channel_size, "Creating JobBroker with worker channels"
        );

        let mut worker_channels = Vec::with_capacity(num_workers);
        let mut worker_receivers = Vec::with_capacity(num_workers);

        for worker_id in 0..num_workers {
            let (tx, rx) = mpsc::channel(channel_size);
            worker_channels.push(tx);
            worker_receivers.push(rx);
            debug!(worker_id, "Created worker channel");
        }

        let broker = Self {
            queue,
            worker_channels,
            next_worker: AtomicUsize::new(0),
        };

        (broker, worker_receivers)
    }

    /// Persist a job and hand it to the next worker
    pub async fn enqueue(&self, job: SyncJob) -> Result<u64, QueueError> {
        let seq = {
            let queue = self.queue.write().await;
            queue.enqueue(&job)?
        };

        debug!(
            seq,
            channel_id = %job.channel_id,
            folder_id = %job.folder_id,
            "Job persisted to queue"
        );

        self.dispatch(JobEnvelope { seq, job }).await;
        Ok(seq)
    }

    /// Send an already-persisted job to the next worker again
    pub async fn redeliver(&self, envelope: JobEnvelope) {
        debug!(seq = envelope.seq, attempt = envelope.job.attempt, "Redelivering job");
        self.dispatch(envelope).await;
    }

    /// Redeliver every job left pending by a previous process
    pub async fn recover(&self) -> Result<usize, QueueError> {
        let pending = self.queue.read().await.pending()?;
        let count = pending.len();

        for (seq, job) in pending {
            self.dispatch(JobEnvelope { seq, job }).await;
        }

        if count > 0 {
            info!(count, "Recovered pending jobs");
        }
        Ok(count)
    }

    async fn dispatch(&self, envelope: JobEnvelope) {
        let seq = envelope.seq;
        let worker_idx =
            self.next_worker.fetch_add(1, Ordering::Relaxed) % self.worker_channels.len();

        match self.worker_channels[worker_idx].send(envelope).await {
            Ok(_) => debug!(seq, worker_idx, "Job sent to worker"),
            Err(_) => warn!(seq, worker_idx, "Worker channel closed, job left pending"),
        }
    }

    /// Check if all worker channels are open
    pub fn health_check(&self) -> bool {
        self.worker_channels.iter().all(|ch| !ch.is_closed())
    }
}
