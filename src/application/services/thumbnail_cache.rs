use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use lru::LruCache;
use tokio::fs;

use crate::application::ports::{ThumbnailGenerator, ThumbnailGeneratorError};
use crate::domain::{ThumbnailKey, VaultPath};

const SUPPORTED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// Derived-preview cache on disk, keyed by normalized source path.
///
/// Entries are generated on a miss and never refreshed; [`flush`] clears the
/// whole cache and is run at process start. With a capacity the least
/// recently used entries are evicted from disk.
///
/// [`flush`]: ThumbnailCache::flush
pub struct ThumbnailCache {
    storage_root: PathBuf,
    cache_dir: PathBuf,
    generator: Arc<dyn ThumbnailGenerator>,
    index: Mutex<LruCache<ThumbnailKey, ()>>,
    generation: tokio::sync::Mutex<()>,
}

impl ThumbnailCache {
    pub fn new(
        storage_root: PathBuf,
        cache_dir: PathBuf,
        generator: Arc<dyn ThumbnailGenerator>,
        capacity: Option<NonZeroUsize>,
    ) -> Self {
        let index = match capacity {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };
        Self {
            storage_root,
            cache_dir,
            generator,
            index: Mutex::new(index),
            generation: tokio::sync::Mutex::new(()),
        }
    }

    pub async fn flush(&self) -> io::Result<()> {
        match fs::remove_dir_all(&self.cache_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        fs::create_dir_all(&self.cache_dir).await?;
        if let Ok(mut index) = self.index.lock() {
            index.clear();
        }
        tracing::info!(dir = %self.cache_dir.display(), "Thumbnail cache flushed");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.index.lock().map(|index| index.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// PNG preview of `source`, generated and stored on a miss.
    #[tracing::instrument(skip(self), fields(source = %source))]
    pub async fn thumbnail(&self, source: &VaultPath) -> Result<Vec<u8>, ThumbnailError> {
        let supported = source
            .extension()
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()));
        if !supported {
            return Err(ThumbnailError::NotAnImage);
        }

        let key = ThumbnailKey::for_source(source);
        let cache_path = self.cache_dir.join(key.as_str());

        if let Some(bytes) = self.read_cached(&key, &cache_path).await? {
            return Ok(bytes);
        }

        let source_path = source.resolve(&self.storage_root);
        match fs::metadata(&source_path).await {
            Ok(meta) if meta.is_file() => {}
            _ => return Err(ThumbnailError::SourceNotFound),
        }

        let _generating = self.generation.lock().await;
        // Another request may have produced it while we waited.
        if let Some(bytes) = self.read_cached(&key, &cache_path).await? {
            return Ok(bytes);
        }

        let bytes = self
            .generator
            .generate(&source_path)
            .await
            .map_err(ThumbnailError::Generation)?;
        fs::write(&cache_path, &bytes)
            .await
            .map_err(ThumbnailError::Cache)?;
        tracing::debug!(key = %key, bytes = bytes.len(), "Thumbnail generated");

        self.remember(key).await;
        Ok(bytes)
    }

    async fn read_cached(
        &self,
        key: &ThumbnailKey,
        cache_path: &Path,
    ) -> Result<Option<Vec<u8>>, ThumbnailError> {
        match fs::read(cache_path).await {
            Ok(bytes) => {
                if let Ok(mut index) = self.index.lock() {
                    index.get(key);
                }
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ThumbnailError::Cache(e)),
        }
    }

    async fn remember(&self, key: ThumbnailKey) {
        let evicted = match self.index.lock() {
            Ok(mut index) => index.push(key.clone(), ()),
            Err(_) => None,
        };
        if let Some((evicted, ())) = evicted {
            if evicted != key {
                let path = self.cache_dir.join(evicted.as_str());
                if let Err(e) = fs::remove_file(&path).await {
                    tracing::warn!(error = %e, key = %evicted, "Failed to evict thumbnail");
                }
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error("Not an image file")]
    NotAnImage,
    #[error("File not found")]
    SourceNotFound,
    #[error("Thumbnail generation failed: {0}")]
    Generation(ThumbnailGeneratorError),
    #[error("thumbnail cache unavailable: {0}")]
    Cache(io::Error),
}
