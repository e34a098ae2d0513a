use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{JobLedger, LedgerError};
use crate::domain::{Job, JobId, JobUpdate};

const RECORD_EXTENSION: &str = "json";

/// Job ledger keeping one pretty-printed JSON document per job id.
///
/// Records are replaced via write-to-temp + rename, so concurrent readers in
/// other processes see either the old or the new document.
pub struct FileJobLedger {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileJobLedger {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| LedgerError::Unavailable(format!("{}: {}", dir.display(), e)))?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: JobId) -> PathBuf {
        self.dir.join(format!("{}.{}", id, RECORD_EXTENSION))
    }

    async fn read_record(path: &Path) -> Result<Option<Job>, LedgerError> {
        let raw = match fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LedgerError::ReadFailed(e.to_string())),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| LedgerError::Corrupt(format!("{}: {}", path.display(), e)))
    }

    async fn write_record(&self, job: &Job) -> Result<(), LedgerError> {
        let json = serde_json::to_vec_pretty(job)
            .map_err(|e| LedgerError::WriteFailed(e.to_string()))?;
        let tmp = self.dir.join(format!(".{}.{}.tmp", job.id, Uuid::new_v4()));

        fs::write(&tmp, &json)
            .await
            .map_err(|e| LedgerError::WriteFailed(e.to_string()))?;
        if let Err(e) = fs::rename(&tmp, self.record_path(job.id)).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(LedgerError::WriteFailed(e.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl JobLedger for FileJobLedger {
    #[instrument(skip(self), fields(job_id = %id))]
    async fn get(&self, id: JobId) -> Result<Option<Job>, LedgerError> {
        Self::read_record(&self.record_path(id)).await
    }

    #[instrument(skip(self, update), fields(job_id = %id, status = ?update.status))]
    async fn merge(&self, id: JobId, update: JobUpdate) -> Result<Job, LedgerError> {
        let _guard = self.write_lock.lock().await;

        let mut job = Self::read_record(&self.record_path(id))
            .await?
            .unwrap_or_else(|| Job::blank(id));

        if !job.merge(&update) {
            tracing::debug!(current = %job.status, "Ledger update ignored for settled job");
            return Ok(job);
        }

        self.write_record(&job).await?;
        Ok(job)
    }

    #[instrument(skip(self))]
    async fn recent(&self, limit: usize) -> Result<Vec<Job>, LedgerError> {
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| LedgerError::ReadFailed(e.to_string()))?;

        let mut jobs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LedgerError::ReadFailed(e.to_string()))?
        {
            let path = entry.path();
            let is_record = path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION)
                && !entry.file_name().to_string_lossy().starts_with('.');
            if !is_record {
                continue;
            }

            match Self::read_record(&path).await {
                Ok(Some(job)) => jobs.push(job),
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable job record"),
            }
        }

        jobs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        jobs.truncate(limit);
        Ok(jobs)
    }
}
