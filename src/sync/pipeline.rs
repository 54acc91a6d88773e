use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::engine::{ImportEngine, ImportSummary};
use super::error::{Result, SyncError};
use crate::catalog::IntegrationStore;
use crate::credentials::CredentialResolver;
use crate::proto::SyncJob;
use crate::provider::StorageProvider;

/// One full run of a sync job: credentials, listing, import, last-sync stamp
pub struct SyncPipeline {
    credentials: CredentialResolver,
    provider: Arc<dyn StorageProvider>,
    engine: ImportEngine,
    integrations: Arc<dyn IntegrationStore>,
}

impl SyncPipeline {
    pub fn new(
        credentials: CredentialResolver,
        provider: Arc<dyn StorageProvider>,
        engine: ImportEngine,
        integrations: Arc<dyn IntegrationStore>,
    ) -> Self {
        Self {
            credentials,
            provider,
            engine,
            integrations,
        }
    }

    #[instrument(
        name = "sync_job",
        skip_all,
        fields(
            channel_id = %job.channel_id,
            folder_id = %job.folder_id,
            trace_id = %job.trace_id,
            attempt = job.attempt,
        )
    )]
    pub async fn run(&self, job: &SyncJob) -> Result<ImportSummary> {
        info!("Sync job started");

        let result = self.execute(job).await;
        match &result {
            Ok(summary) => info!(
                imported = summary.imported,
                skipped = summary.skipped,
                failed = summary.failed,
                total = summary.total(),
                "Sync job completed"
            ),
            Err(e) => error!(kind = e.kind(), error = %e, "Sync job failed"),
        }

        result
    }

    async fn execute(&self, job: &SyncJob) -> Result<ImportSummary> {
        check_job(job)?;

        let token = self.credentials.resolve(&job.integration_id).await?;
        let files = self.provider.list_folder(&token, &job.folder_id).await?;
        debug!(count = files.len(), "Remote folder listed");

        let summary = self.engine.import(&job.channel_id, &files).await?;

        // Informational only; a missed stamp does not fail the job
        if let Err(e) = self
            .integrations
            .touch_last_sync(&job.integration_id, Utc::now())
            .await
        {
            warn!(integration_id = %job.integration_id, error = %e, "Failed to update last sync");
        }

        Ok(summary)
    }
}

fn check_job(job: &SyncJob) -> Result<()> {
    for (field, value) in [
        ("channelId", &job.channel_id),
        ("integrationId", &job.integration_id),
        ("folderId", &job.folder_id),
    ] {
        if value.trim().is_empty() {
            return Err(SyncError::Configuration(format!("job has an empty {}", field)));
        }
    }
    Ok(())
}
