use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::ImageFormat;
use image::imageops::FilterType;

use crate::application::ports::{ThumbnailGenerator, ThumbnailGeneratorError};

pub const THUMBNAIL_SIZE: u32 = 100;

/// Crop-to-fill PNG previews rendered with the `image` crate.
#[derive(Debug, Clone)]
pub struct ImageThumbnailer {
    width: u32,
    height: u32,
}

impl ImageThumbnailer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Blocking; call through [`ThumbnailGenerator::generate`] from async code.
    pub fn render(&self, source: &Path) -> Result<Vec<u8>, ThumbnailGeneratorError> {
        let img = image::ImageReader::open(source)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| ThumbnailGeneratorError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| ThumbnailGeneratorError::Decode(e.to_string()))?;

        let thumbnail = img.resize_to_fill(self.width, self.height, FilterType::Triangle);

        let mut buf = Vec::new();
        thumbnail
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| ThumbnailGeneratorError::Encode(e.to_string()))?;
        Ok(buf)
    }
}

impl Default for ImageThumbnailer {
    fn default() -> Self {
        Self::new(THUMBNAIL_SIZE, THUMBNAIL_SIZE)
    }
}

#[async_trait]
impl ThumbnailGenerator for ImageThumbnailer {
    async fn generate(&self, source: &Path) -> Result<Vec<u8>, ThumbnailGeneratorError> {
        let renderer = self.clone();
        let source: PathBuf = source.to_path_buf();

        tokio::task::spawn_blocking(move || renderer.render(&source))
            .await
            .map_err(|e| ThumbnailGeneratorError::Task(e.to_string()))?
    }
}
