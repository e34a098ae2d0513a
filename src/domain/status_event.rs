use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Job, JobId, JobStatus};

/// Notification that a job reached a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl From<&Job> for StatusEvent {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            status: job.status,
            file: job.file.clone(),
            error: job.error.clone(),
            updated_at: job.updated_at,
        }
    }
}
