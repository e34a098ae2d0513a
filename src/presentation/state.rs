use std::sync::Arc;

use crate::application::ports::{CredentialVerifier, JobLedger};
use crate::application::services::{ThumbnailCache, UploadService};

#[derive(Clone)]
pub struct AppState {
    pub upload_service: Arc<UploadService>,
    pub job_ledger: Arc<dyn JobLedger>,
    pub thumbnail_cache: Arc<ThumbnailCache>,
    pub credential_verifier: Arc<dyn CredentialVerifier>,
    pub recent_limit: usize,
    pub max_upload_bytes: usize,
}
