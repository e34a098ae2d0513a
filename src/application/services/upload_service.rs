use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::BoxStream;

use crate::application::ports::{
    BrokerError, JobLedger, MessageBroker, StagingStore, StagingStoreError, UPLOAD_QUEUE,
};
use crate::domain::{JobId, JobUpdate, RelocationTask, StoragePath, VaultPath};

/// An upload whose bytes sit in the staging area, not yet handed to the worker.
#[derive(Debug, Clone)]
pub struct StagedUpload {
    pub job_id: JobId,
    pub file_name: String,
    pub storage_path: StoragePath,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedUpload {
    pub job_id: JobId,
    pub file_name: String,
    pub target_path: PathBuf,
}

/// Front-door half of the ingestion pipeline: stage, then enqueue.
pub struct UploadService {
    staging_store: Arc<dyn StagingStore>,
    broker: Arc<dyn MessageBroker>,
    ledger: Arc<dyn JobLedger>,
    storage_root: PathBuf,
}

impl UploadService {
    pub fn new(
        staging_store: Arc<dyn StagingStore>,
        broker: Arc<dyn MessageBroker>,
        ledger: Arc<dyn JobLedger>,
        storage_root: PathBuf,
    ) -> Self {
        Self {
            staging_store,
            broker,
            ledger,
            storage_root,
        }
    }

    /// Streams the upload body to the staging area under a fresh job id.
    pub async fn stage(
        &self,
        file_name: &str,
        stream: BoxStream<'_, Result<Bytes, io::Error>>,
    ) -> Result<StagedUpload, UploadError> {
        let job_id = JobId::new();
        let storage_path = StoragePath::new(&job_id, file_name);

        let size_bytes = match self.staging_store.store(&storage_path, stream).await {
            Ok(size) => size,
            Err(e) => {
                self.remove_staged(&storage_path).await;
                return Err(UploadError::Staging(e));
            }
        };

        Ok(StagedUpload {
            job_id,
            file_name: file_name.to_string(),
            storage_path,
            size_bytes,
        })
    }

    /// Hands a staged upload to the worker.
    ///
    /// The target path is not checked for collisions here; the worker resolves
    /// them against the tree as it is at move time. Returns only once the
    /// broker has taken the task; on failure the staged bytes are removed and
    /// no job exists.
    #[tracing::instrument(skip(self, staged), fields(job_id = %staged.job_id, file = %staged.file_name))]
    pub async fn enqueue(
        &self,
        staged: StagedUpload,
        target_dir: &VaultPath,
    ) -> Result<AcceptedUpload, UploadError> {
        let target_path = target_dir
            .join(&staged.file_name)
            .resolve(&self.storage_root);

        let temp_path = match self.staging_store.local_path(&staged.storage_path) {
            Ok(path) => path,
            Err(e) => {
                self.discard(&staged).await;
                return Err(UploadError::Staging(e));
            }
        };

        let task = RelocationTask::new(staged.job_id, temp_path, target_path.clone());
        let payload = match serde_json::to_vec(&task) {
            Ok(payload) => payload,
            Err(e) => {
                self.discard(&staged).await;
                return Err(UploadError::Encode(e));
            }
        };

        if let Err(e) = self.broker.publish(UPLOAD_QUEUE, &payload).await {
            tracing::error!(error = %e, "Failed to enqueue relocation task");
            self.discard(&staged).await;
            return Err(UploadError::Enqueue(e));
        }

        // The worker may already have settled the job; the merge then keeps
        // the terminal record.
        if let Err(e) = self.ledger.merge(staged.job_id, JobUpdate::queued()).await {
            tracing::warn!(error = %e, "Failed to record queued job");
        }

        tracing::info!(
            bytes = staged.size_bytes,
            target = %target_path.display(),
            "Upload accepted"
        );

        Ok(AcceptedUpload {
            job_id: staged.job_id,
            file_name: staged.file_name,
            target_path,
        })
    }

    pub async fn discard(&self, staged: &StagedUpload) {
        self.remove_staged(&staged.storage_path).await;
    }

    async fn remove_staged(&self, path: &StoragePath) {
        if let Err(e) = self.staging_store.delete(path).await {
            tracing::debug!(error = %e, path = %path, "Staged upload not removed");
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("staging: {0}")]
    Staging(StagingStoreError),
    #[error("enqueue: {0}")]
    Enqueue(BrokerError),
    #[error("encode task: {0}")]
    Encode(serde_json::Error),
}
