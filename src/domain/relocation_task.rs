use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::JobId;

/// Queue message asking the worker to move a staged upload into the vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelocationTask {
    pub job_id: JobId,
    pub temp_path: PathBuf,
    pub target_path: PathBuf,
}

impl RelocationTask {
    pub fn new(job_id: JobId, temp_path: PathBuf, target_path: PathBuf) -> Self {
        Self {
            job_id,
            temp_path,
            target_path,
        }
    }
}
