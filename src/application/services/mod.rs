mod background_tasks;
mod ingestion_worker;
mod status_subscriber;
mod thumbnail_cache;
mod upload_service;

pub use background_tasks::{BackgroundTaskError, BackgroundTasks};
pub use ingestion_worker::{IngestionWorker, IngestionWorkerError};
pub use status_subscriber::{StatusSubscriber, StatusSubscriberError};
pub use thumbnail_cache::{ThumbnailCache, ThumbnailError};
pub use upload_service::{AcceptedUpload, StagedUpload, UploadError, UploadService};
