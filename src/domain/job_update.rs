use chrono::{DateTime, Utc};

use super::{JobStatus, StatusEvent};

/// Partial change to a [`Job`](super::Job). Absent fields leave the stored
/// value untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub file: Option<String>,
    pub error: Option<String>,
    pub at: DateTime<Utc>,
}

impl JobUpdate {
    fn new(status: Option<JobStatus>) -> Self {
        Self {
            status,
            file: None,
            error: None,
            at: Utc::now(),
        }
    }

    pub fn queued() -> Self {
        Self::new(Some(JobStatus::Queued))
    }

    pub fn done(file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            ..Self::new(Some(JobStatus::Done))
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(Some(JobStatus::Failed))
        }
    }

    /// Records the name chosen by collision resolution before the move starts.
    pub fn resolved_file(file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            ..Self::new(None)
        }
    }

    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.at = at;
        self
    }
}

impl From<&StatusEvent> for JobUpdate {
    fn from(event: &StatusEvent) -> Self {
        Self {
            status: Some(event.status),
            file: event.file.clone(),
            error: event.error.clone(),
            at: event.updated_at,
        }
    }
}
