use async_trait::async_trait;

use crate::domain::{Job, JobId, JobUpdate};

use super::LedgerError;

/// Durable mapping from job id to its latest record.
#[async_trait]
pub trait JobLedger: Send + Sync {
    async fn get(&self, id: JobId) -> Result<Option<Job>, LedgerError>;

    /// Read-merge-write: loads the record (or a blank one), merges `update`
    /// and persists the result, which is returned.
    async fn merge(&self, id: JobId, update: JobUpdate) -> Result<Job, LedgerError>;

    /// Most recently updated records first, at most `limit` of them.
    async fn recent(&self, limit: usize) -> Result<Vec<Job>, LedgerError>;
}
