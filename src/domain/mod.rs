mod job;
mod job_id;
mod job_status;
mod job_update;
mod relocation_task;
mod status_event;
mod storage_path;
mod thumbnail_key;
mod vault_path;

pub use job::Job;
pub use job_id::JobId;
pub use job_status::JobStatus;
pub use job_update::JobUpdate;
pub use relocation_task::RelocationTask;
pub use status_event::StatusEvent;
pub use storage_path::StoragePath;
pub use thumbnail_key::ThumbnailKey;
pub use vault_path::{VaultPath, VaultPathError, sanitize_file_name};
