mod common;

use common::{CHANNEL, FOLDER, FakeDrive, Harness, INTEGRATION, fast_retry, mixed_folder};
use mediasync::catalog::{IntegrationStore, MediaCatalog};
use mediasync::classify::MediaKind;
use mediasync::proto::SyncJob;
use mediasync::queue::JobEnvelope;

fn job() -> SyncJob {
    SyncJob::new(CHANNEL, INTEGRATION, FOLDER)
}

#[tokio::test]
async fn test_job_imports_and_acks() {
    let mut harness = Harness::new(FakeDrive::new().with_folder(FOLDER, mixed_folder()));
    let workers = harness.start(fast_retry(3)).await;

    harness.broker.enqueue(job()).await.unwrap();
    harness.wait_until_idle().await;
    workers.stop().await;

    let mut entries = harness.catalog.list_channel(CHANNEL).await.unwrap();
    entries.sort_by(|a, b| a.storage_file_id.cmp(&b.storage_file_id));
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].media_type, MediaKind::Image);
    assert_eq!(entries[0].file_size, Some(1024));
    assert_eq!(
        entries[0].thumbnail_url.as_deref(),
        Some("https://thumbs.example.com/f1")
    );
    assert_eq!(entries[1].media_type, MediaKind::Video);
    assert_eq!(entries[1].file_size, None);

    let record = harness
        .catalog
        .get_integration(INTEGRATION)
        .await
        .unwrap()
        .unwrap();
    assert!(record.last_sync_at.is_some());

    let snapshot = harness.metrics.snapshot();
    assert_eq!(snapshot.jobs_completed, 1);
    assert_eq!(snapshot.files_imported, 2);
    assert_eq!(snapshot.files_skipped, 1);
    assert!(harness.queue.read().await.list_dlq(10).unwrap().is_empty());
}

#[tokio::test]
async fn test_redelivered_job_is_idempotent() {
    let mut harness = Harness::new(FakeDrive::new().with_folder(FOLDER, mixed_folder()));
    let workers = harness.start(fast_retry(3)).await;

    harness.broker.enqueue(job()).await.unwrap();
    harness.broker.enqueue(job()).await.unwrap();
    harness.broker.enqueue(job()).await.unwrap();
    harness.wait_until_idle().await;
    workers.stop().await;

    assert_eq!(harness.catalog.list_channel(CHANNEL).await.unwrap().len(), 2);

    let snapshot = harness.metrics.snapshot();
    assert_eq!(snapshot.jobs_completed, 3);
    assert_eq!(snapshot.files_imported, 2);
    assert_eq!(snapshot.files_skipped, 7);
}

#[tokio::test]
async fn test_rejected_credentials_dead_letter_without_retry() {
    let mut harness = Harness::new(
        FakeDrive::new()
            .with_folder(FOLDER, mixed_folder())
            .rejecting_tokens(),
    );
    let workers = harness.start(fast_retry(5)).await;

    let seq = harness.broker.enqueue(job()).await.unwrap();
    harness.wait_until_idle().await;
    workers.stop().await;

    let entry = harness
        .queue
        .read()
        .await
        .get_dlq_job(seq)
        .unwrap()
        .unwrap();
    assert_eq!(entry.failure_code, "AUTH_ERROR");
    assert_eq!(entry.attempts, 1);
    assert_eq!(harness.drive.list_calls(), 0);
    assert!(harness.catalog.list_channel(CHANNEL).await.unwrap().is_empty());
    assert_eq!(harness.metrics.snapshot().jobs_dead_lettered, 1);
}

#[tokio::test]
async fn test_missing_integration_is_configuration_error() {
    let mut harness = Harness::new(FakeDrive::new().with_folder(FOLDER, mixed_folder()));
    let workers = harness.start(fast_retry(5)).await;

    let seq = harness
        .broker
        .enqueue(SyncJob::new(CHANNEL, "integ-unknown", FOLDER))
        .await
        .unwrap();
    harness.wait_until_idle().await;
    workers.stop().await;

    let entry = harness
        .queue
        .read()
        .await
        .get_dlq_job(seq)
        .unwrap()
        .unwrap();
    assert_eq!(entry.failure_code, "CONFIGURATION_ERROR");
    assert!(harness.catalog.list_channel(CHANNEL).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_folder_is_configuration_error() {
    let mut harness = Harness::new(FakeDrive::new());
    let workers = harness.start(fast_retry(5)).await;

    let seq = harness.broker.enqueue(job()).await.unwrap();
    harness.wait_until_idle().await;
    workers.stop().await;

    let entry = harness
        .queue
        .read()
        .await
        .get_dlq_job(seq)
        .unwrap()
        .unwrap();
    assert_eq!(entry.failure_code, "CONFIGURATION_ERROR");
    assert_eq!(harness.drive.list_calls(), 1);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let mut harness = Harness::new(
        FakeDrive::new()
            .with_folder(FOLDER, mixed_folder())
            .failing_listings(1),
    );
    let workers = harness.start(fast_retry(3)).await;

    harness.broker.enqueue(job()).await.unwrap();
    harness.wait_until_idle().await;
    workers.stop().await;

    assert_eq!(harness.drive.list_calls(), 2);
    assert_eq!(harness.catalog.list_channel(CHANNEL).await.unwrap().len(), 2);

    let snapshot = harness.metrics.snapshot();
    assert_eq!(snapshot.jobs_retried, 1);
    assert_eq!(snapshot.jobs_completed, 1);
    assert_eq!(snapshot.jobs_dead_lettered, 0);
}

#[tokio::test]
async fn test_retries_exhausted_dead_letter() {
    let mut harness = Harness::new(
        FakeDrive::new()
            .with_folder(FOLDER, mixed_folder())
            .failing_listings(10),
    );
    let workers = harness.start(fast_retry(3)).await;

    let seq = harness.broker.enqueue(job()).await.unwrap();
    harness.wait_until_idle().await;
    workers.stop().await;

    let entry = harness
        .queue
        .read()
        .await
        .get_dlq_job(seq)
        .unwrap()
        .unwrap();
    assert_eq!(entry.failure_code, "TRANSIENT_PROVIDER_ERROR");
    assert_eq!(entry.attempts, 3);
    assert_eq!(entry.job.unwrap().attempt, 3);
    assert_eq!(harness.drive.list_calls(), 3);
    assert_eq!(harness.metrics.snapshot().jobs_retried, 2);
}

#[tokio::test]
async fn test_pending_jobs_recovered_on_start() {
    let mut harness = Harness::new(FakeDrive::new().with_folder(FOLDER, mixed_folder()));

    // Left behind by a previous process
    harness.queue.read().await.enqueue(&job()).unwrap();

    let workers = harness.start(fast_retry(3)).await;
    harness.wait_until_idle().await;
    workers.stop().await;

    assert_eq!(harness.catalog.list_channel(CHANNEL).await.unwrap().len(), 2);
    assert_eq!(harness.metrics.snapshot().jobs_completed, 1);
}

#[tokio::test]
async fn test_retry_redelivered_when_reschedule_fails() {
    let mut harness = Harness::new(
        FakeDrive::new()
            .with_folder(FOLDER, mixed_folder())
            .failing_listings(1),
    );
    let workers = harness.start(fast_retry(3)).await;

    // Never persisted, so rescheduling it fails
    harness
        .broker
        .redeliver(JobEnvelope {
            seq: 9_999,
            job: job(),
        })
        .await;
    harness.wait_for_completed(1).await;
    workers.stop().await;

    assert_eq!(harness.drive.list_calls(), 2);
    assert_eq!(harness.metrics.snapshot().jobs_retried, 1);
    assert_eq!(harness.catalog.list_channel(CHANNEL).await.unwrap().len(), 2);
}
