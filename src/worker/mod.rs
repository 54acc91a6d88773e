//! Sync worker pool
//!
//! Each worker owns one broker channel and runs jobs one at a time. A job's
//! queue entry is removed only once it is settled:
//! - success: acked
//! - retryable failure with attempts left: rescheduled and redelivered after
//!   exponential backoff
//! - anything else: moved to the DLQ with its error kind
//!
//! A job interrupted by shutdown stays pending and is redelivered by
//! [`JobBroker::recover`] on the next start.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::RetryConfig;
use crate::observability::Metrics;
use crate::queue::{JobBroker, JobEnvelope, SharedQueue};
use crate::sync::{SyncError, SyncPipeline};

#[derive(bon::Builder)]
pub struct SyncWorker {
    queue: SharedQueue,
    broker: Arc<JobBroker>,
    pipeline: Arc<SyncPipeline>,
    #[builder(default)]
    retry: RetryConfig,
    #[builder(default)]
    metrics: Arc<Metrics>,
}

/// Running worker pool; dropping it also stops the workers, without waiting
pub struct WorkerHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Signal every worker and wait for in-flight jobs to settle
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Worker task panicked");
            }
        }
        info!("Sync workers stopped");
    }
}

impl SyncWorker {
    /// Spawn one task per receiver, then redeliver jobs left pending by a
    /// previous process
    pub async fn start(
        self: &Arc<Self>,
        receivers: Vec<mpsc::Receiver<JobEnvelope>>,
    ) -> WorkerHandle {
        let (shutdown, shutdown_rx) = watch::channel(false);

        let tasks: Vec<_> = receivers
            .into_iter()
            .enumerate()
            .map(|(worker_id, rx)| {
                let worker = Arc::clone(self);
                let shutdown_rx = shutdown_rx.clone();
                tokio::spawn(async move { worker.run_loop(worker_id, rx, shutdown_rx).await })
            })
            .collect();

        info!(workers = tasks.len(), "Sync workers started");

        if let Err(e) = self.broker.recover().await {
            error!(error = %e, "Failed to recover pending jobs");
        }

        WorkerHandle { shutdown, tasks }
    }

    async fn run_loop(
        self: Arc<Self>,
        worker_id: usize,
        mut rx: mpsc::Receiver<JobEnvelope>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                envelope = rx.recv() => match envelope {
                    Some(envelope) => self.process(envelope).await,
                    None => break,
                },
            }
        }
        info!(worker_id, "Worker exiting");
    }

    async fn process(&self, envelope: JobEnvelope) {
        match self.pipeline.run(&envelope.job).await {
            Ok(summary) => {
                self.metrics.job_completed(&summary);
                if let Err(e) = self.queue.write().await.ack(envelope.seq) {
                    error!(seq = envelope.seq, error = %e, "Failed to ack job");
                }
            }
            Err(err) if err.is_retryable() && envelope.job.attempt < self.retry.max_attempts => {
                self.schedule_retry(envelope, &err).await
            }
            Err(err) => self.dead_letter(envelope, &err).await,
        }
    }

    async fn schedule_retry(&self, mut envelope: JobEnvelope, err: &SyncError) {
        let delay = backoff_delay(&self.retry, envelope.job.attempt);
        envelope.job.attempt += 1;

        // Retries stay bounded by the in-memory attempt
        if let Err(e) = self
            .queue
            .write()
            .await
            .reschedule(envelope.seq, &envelope.job)
        {
            error!(
                seq = envelope.seq,
                error = %e,
                "Failed to persist attempt, redelivering with stored attempt unchanged"
            );
        }

        self.metrics.job_retried();
        warn!(
            seq = envelope.seq,
            next_attempt = envelope.job.attempt,
            delay_ms = delay.as_millis() as u64,
            kind = err.kind(),
            "Retrying sync job"
        );

        let broker = Arc::clone(&self.broker);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            broker.redeliver(envelope).await;
        });
    }

    async fn dead_letter(&self, envelope: JobEnvelope, err: &SyncError) {
        let result = self.queue.write().await.move_to_dlq(
            envelope.seq,
            err.kind().to_string(),
            err.to_string(),
            envelope.job.attempt,
        );

        match result {
            Ok(()) => {
                self.metrics.job_dead_lettered();
                warn!(
                    seq = envelope.seq,
                    attempts = envelope.job.attempt,
                    kind = err.kind(),
                    "Sync job dead-lettered"
                );
            }
            Err(e) => error!(seq = envelope.seq, error = %e, "Failed to dead-letter job"),
        }
    }
}

/// Delay before redelivering a job whose `attempt`-th run just failed
pub fn backoff_delay(retry: &RetryConfig, attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    let millis = retry
        .base_backoff_ms
        .saturating_mul(factor)
        .min(retry.max_backoff_ms);
    Duration::from_millis(millis)
}
