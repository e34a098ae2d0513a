use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{JobId, JobStatus, JobUpdate};

/// One tracked attempt to relocate an uploaded file into the vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Empty record a first update is merged into.
    pub fn blank(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            file: None,
            error: None,
            updated_at: DateTime::<Utc>::default(),
        }
    }

    /// Shallow-merges `update` into the record.
    ///
    /// Terminal records only accept updates carrying the same terminal status,
    /// so re-applying an update is a no-op and the order in which two writers
    /// land does not change the result. A failed record never names a file.
    /// Returns whether the update was taken.
    pub fn merge(&mut self, update: &JobUpdate) -> bool {
        let next = update.status.unwrap_or(self.status);
        if !self.status.can_become(next) {
            return false;
        }
        if self.status.is_terminal() && update.status.is_none() {
            return false;
        }

        self.status = next;
        if next == JobStatus::Failed {
            // A name recorded ahead of a move that never landed.
            self.file = None;
        } else if let Some(file) = &update.file {
            self.file = Some(file.clone());
        }
        if let Some(error) = &update.error {
            self.error = Some(error.clone());
        }
        if update.at > self.updated_at {
            self.updated_at = update.at;
        }
        true
    }
}
