use std::path::Path;

use async_trait::async_trait;

/// Renders a fixed-size preview of an image file.
#[async_trait]
pub trait ThumbnailGenerator: Send + Sync {
    /// Encoded PNG bytes of the preview.
    async fn generate(&self, source: &Path) -> Result<Vec<u8>, ThumbnailGeneratorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ThumbnailGeneratorError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("generation task failed: {0}")]
    Task(String),
}
