#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{RwLock, mpsc};

use mediasync::catalog::{FjallCatalog, IntegrationRecord};
use mediasync::config::RetryConfig;
use mediasync::credentials::CredentialResolver;
use mediasync::observability::Metrics;
use mediasync::provider::{
    AccessToken, ClientCredentials, ProviderError, RemoteFile, StorageProvider,
};
use mediasync::queue::{FjallQueue, JobBroker, JobEnvelope, SharedQueue};
use mediasync::secrets::{SecretCipher, SecretError};
use mediasync::sync::{FailurePolicy, ImportEngine, SyncPipeline};
use mediasync::worker::{SyncWorker, WorkerHandle};

pub const CHANNEL: &str = "chan-1";
pub const INTEGRATION: &str = "integ-1";
pub const FOLDER: &str = "folder-1";
pub const CONTENT_HOST: &str = "lh3.googleusercontent.com";

/// Secrets are stored in the clear in tests
pub struct PlainCipher;

impl SecretCipher for PlainCipher {
    fn decrypt(&self, ciphertext: &str) -> Result<String, SecretError> {
        Ok(ciphertext.to_string())
    }
}

/// In-memory storage provider with scripted failures
#[derive(Default)]
pub struct FakeDrive {
    folders: HashMap<String, Vec<RemoteFile>>,
    reject_tokens: bool,
    list_failures: Mutex<VecDeque<ProviderError>>,
    pub token_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
}

impl FakeDrive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_folder(mut self, folder_id: &str, files: Vec<RemoteFile>) -> Self {
        self.folders.insert(folder_id.to_string(), files);
        self
    }

    pub fn rejecting_tokens(mut self) -> Self {
        self.reject_tokens = true;
        self
    }

    /// The next `count` listings fail with a 503
    pub fn failing_listings(self, count: usize) -> Self {
        {
            let mut failures = self.list_failures.lock().unwrap();
            for _ in 0..count {
                failures.push_back(ProviderError::Unavailable {
                    status: Some(503),
                    message: "backend error".to_string(),
                });
            }
        }
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageProvider for FakeDrive {
    async fn refresh_access_token(
        &self,
        _credentials: &ClientCredentials,
    ) -> mediasync::provider::Result<AccessToken> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_tokens {
            return Err(ProviderError::Rejected {
                status: 400,
                message: "invalid_grant".to_string(),
            });
        }
        Ok(AccessToken::new("ya29.fake"))
    }

    async fn list_folder(
        &self,
        _token: &AccessToken,
        folder_id: &str,
    ) -> mediasync::provider::Result<Vec<RemoteFile>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.list_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.folders
            .get(folder_id)
            .cloned()
            .ok_or_else(|| ProviderError::InvalidRequest {
                status: 404,
                message: format!("File not found: {}", folder_id),
            })
    }
}

pub fn remote_file(id: &str, mime_type: &str, size: Option<&str>) -> RemoteFile {
    RemoteFile {
        id: id.to_string(),
        name: format!("{}.bin", id),
        mime_type: mime_type.to_string(),
        thumbnail_url: Some(format!("https://thumbs.example.com/{}", id)),
        size: size.map(str::to_string),
    }
}

/// f1 image, f2 unsupported, f3 video with a malformed size
pub fn mixed_folder() -> Vec<RemoteFile> {
    vec![
        remote_file("f1", "image/png", Some("1024")),
        remote_file("f2", "application/pdf", None),
        remote_file("f3", "video/mp4", Some("abc")),
    ]
}

pub fn integration() -> IntegrationRecord {
    let config: Map<String, Value> = serde_json::from_value(json!({
        "clientId": "client-1",
        "encryptedRefreshToken": "refresh-1",
        "encryptedClientSecret": "secret-1"
    }))
    .unwrap();

    IntegrationRecord {
        id: INTEGRATION.to_string(),
        channel_id: CHANNEL.to_string(),
        provider: "google_drive".to_string(),
        config,
        last_sync_at: None,
    }
}

pub fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        base_backoff_ms: 10,
        max_backoff_ms: 50,
    }
}

/// Catalog, queue and broker in a temp dir, with the worker not yet started
pub struct Harness {
    _dir: TempDir,
    pub catalog: Arc<FjallCatalog>,
    pub queue: SharedQueue,
    pub broker: Arc<JobBroker>,
    pub metrics: Arc<Metrics>,
    pub drive: Arc<FakeDrive>,
    receivers: Option<Vec<mpsc::Receiver<JobEnvelope>>>,
}

impl Harness {
    pub fn new(drive: FakeDrive) -> Self {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(FjallCatalog::open(dir.path().join("catalog")).unwrap());
        catalog.put_integration(&integration()).unwrap();

        let queue: SharedQueue = Arc::new(RwLock::new(
            FjallQueue::open(dir.path().join("queue")).unwrap(),
        ));
        let (broker, receivers) = JobBroker::new(queue.clone(), 2, 16);

        Self {
            _dir: dir,
            catalog,
            queue,
            broker: Arc::new(broker),
            metrics: Arc::new(Metrics::new()),
            drive: Arc::new(drive),
            receivers: Some(receivers),
        }
    }

    pub async fn start(&mut self, retry: RetryConfig) -> WorkerHandle {
        let pipeline = SyncPipeline::new(
            CredentialResolver::new(self.catalog.clone(), Arc::new(PlainCipher), self.drive.clone()),
            self.drive.clone(),
            ImportEngine::new(self.catalog.clone(), CONTENT_HOST, FailurePolicy::Isolate),
            self.catalog.clone(),
        );

        let worker = Arc::new(
            SyncWorker::builder()
                .queue(self.queue.clone())
                .broker(self.broker.clone())
                .pipeline(Arc::new(pipeline))
                .retry(retry)
                .metrics(self.metrics.clone())
                .build(),
        );

        let receivers = self.receivers.take().expect("worker already started");
        worker.start(receivers).await
    }

    /// Wait until `count` jobs have completed successfully
    pub async fn wait_for_completed(&self, count: u64) {
        for _ in 0..200 {
            if self.metrics.snapshot().jobs_completed >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("fewer than {} jobs completed after 5s", count);
    }

    /// Wait until every job has been acked or dead-lettered
    pub async fn wait_until_idle(&self) {
        for _ in 0..200 {
            if self.queue.read().await.pending().unwrap().is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("jobs still pending after 5s");
    }
}
