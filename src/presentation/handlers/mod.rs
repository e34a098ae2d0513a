mod error_response;
mod health;
mod job_status;
mod thumbnail;
mod upload;

pub use error_response::{ErrorResponse, error_response};
pub use health::health_handler;
pub use job_status::{JobView, job_status_handler, jobs_batch_handler, recent_jobs_handler};
pub use thumbnail::thumbnail_handler;
pub use upload::{UploadResponse, upload_handler};
