#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;

use vaultd::application::ports::{
    BrokerError, FileRelocator, JobLedger, LedgerError, MessageBroker, RelocationError,
    Subscription, ThumbnailGenerator, ThumbnailGeneratorError, UPLOAD_QUEUE,
};
use vaultd::application::services::{IngestionWorker, StagedUpload, UploadService};
use vaultd::domain::{Job, JobId, JobUpdate};
use vaultd::infrastructure::broker::InMemoryBroker;
use vaultd::infrastructure::persistence::FileJobLedger;
use vaultd::infrastructure::storage::{LocalFileRelocator, LocalStagingStore};

pub const STUB_PNG: &[u8] = b"\x89PNG\r\n\x1a\nstub";

/// A throwaway vault: storage root, staging area and ledger under one temp dir,
/// wired to an in-memory broker.
pub struct TestVault {
    pub dir: tempfile::TempDir,
    pub storage_root: PathBuf,
    pub staging_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub broker: Arc<InMemoryBroker>,
    pub ledger: Arc<FileJobLedger>,
    pub staging_store: Arc<LocalStagingStore>,
}

impl TestVault {
    pub async fn new() -> Self {
        let dir = tempfile::TempDir::new().unwrap();
        let storage_root = dir.path().join("vault");
        let staging_dir = dir.path().join("staging");
        let cache_dir = dir.path().join("thumbnails");
        std::fs::create_dir_all(&storage_root).unwrap();

        let ledger = FileJobLedger::open(dir.path().join("state").join("jobs"))
            .await
            .unwrap();
        let staging_store = LocalStagingStore::new(staging_dir.clone()).unwrap();

        Self {
            dir,
            storage_root,
            staging_dir,
            cache_dir,
            broker: Arc::new(InMemoryBroker::new()),
            ledger: Arc::new(ledger),
            staging_store: Arc::new(staging_store),
        }
    }

    pub fn upload_service(&self) -> UploadService {
        UploadService::new(
            self.staging_store.clone(),
            self.broker.clone(),
            self.ledger.clone(),
            self.storage_root.clone(),
        )
    }

    pub fn worker(&self) -> IngestionWorker {
        self.worker_with(Arc::new(LocalFileRelocator::new()))
    }

    pub fn worker_with(&self, relocator: Arc<dyn FileRelocator>) -> IngestionWorker {
        IngestionWorker::new(self.broker.clone(), self.ledger.clone(), relocator)
    }

    pub async fn stage(
        &self,
        service: &UploadService,
        name: &str,
        content: &[u8],
    ) -> StagedUpload {
        let chunks = vec![Ok::<_, io::Error>(Bytes::copy_from_slice(content))];
        service
            .stage(name, Box::pin(stream::iter(chunks)))
            .await
            .unwrap()
    }

    /// Feeds every queued relocation task through `worker`, one at a time.
    pub async fn drain_uploads(&self, worker: &IngestionWorker) {
        let mut subscription = self.broker.subscribe(UPLOAD_QUEUE, 1).await.unwrap();
        while self.broker.pending(UPLOAD_QUEUE) > 0 {
            let delivery = subscription.next().await.unwrap().unwrap();
            worker
                .handle_delivery(&mut *subscription, delivery)
                .await
                .unwrap();
        }
    }

    pub fn vault_file(&self, relative: &str) -> PathBuf {
        self.storage_root.join(relative)
    }
}

pub fn write_file(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]))
        .save(path)
        .unwrap();
}

/// Broker that refuses every call, as when Redis is down.
pub struct UnavailableBroker;

#[async_trait]
impl MessageBroker for UnavailableBroker {
    async fn publish(&self, _queue: &str, _payload: &[u8]) -> Result<(), BrokerError> {
        Err(BrokerError::PublishFailed("connection refused".to_string()))
    }

    async fn subscribe(
        &self,
        _queue: &str,
        _prefetch: usize,
    ) -> Result<Box<dyn Subscription>, BrokerError> {
        Err(BrokerError::ConnectionFailed("connection refused".to_string()))
    }
}

/// Ledger whose writes always fail.
pub struct ReadOnlyLedger;

#[async_trait]
impl JobLedger for ReadOnlyLedger {
    async fn get(&self, _id: JobId) -> Result<Option<Job>, LedgerError> {
        Ok(None)
    }

    async fn merge(&self, _id: JobId, _update: JobUpdate) -> Result<Job, LedgerError> {
        Err(LedgerError::WriteFailed("read-only file system".to_string()))
    }

    async fn recent(&self, _limit: usize) -> Result<Vec<Job>, LedgerError> {
        Ok(Vec::new())
    }
}

/// Resolves names like the real relocator but every move is refused.
pub struct DenyingRelocator;

#[async_trait]
impl FileRelocator for DenyingRelocator {
    async fn exists(&self, path: &Path) -> bool {
        LocalFileRelocator::new().exists(path).await
    }

    async fn resolve_collision(&self, target: &Path) -> Result<PathBuf, RelocationError> {
        LocalFileRelocator::new().resolve_collision(target).await
    }

    async fn relocate(&self, source: &Path, destination: &Path) -> Result<(), RelocationError> {
        Err(RelocationError::Move {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        })
    }
}

/// Returns a fixed PNG stub and counts how often it was asked to.
#[derive(Default)]
pub struct CountingThumbnailer {
    calls: AtomicUsize,
}

impl CountingThumbnailer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ThumbnailGenerator for CountingThumbnailer {
    async fn generate(&self, _source: &Path) -> Result<Vec<u8>, ThumbnailGeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(STUB_PNG.to_vec())
    }
}
