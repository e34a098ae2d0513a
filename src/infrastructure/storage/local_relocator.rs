use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::{FileRelocator, RelocationError};

const MAX_COLLISION_SUFFIX: u32 = 10_000;

/// Relocates staged uploads on the local filesystem.
#[derive(Debug, Default, Clone)]
pub struct LocalFileRelocator;

impl LocalFileRelocator {
    pub fn new() -> Self {
        Self
    }
}

/// `photo.jpg` + 2 -> `photo(2).jpg`; `README` + 1 -> `README(1)`.
pub fn suffixed_name(file_name: &str, counter: u32) -> String {
    let path = Path::new(file_name);
    match (
        path.file_stem().and_then(|s| s.to_str()),
        path.extension().and_then(|e| e.to_str()),
    ) {
        (Some(stem), Some(ext)) => format!("{stem}({counter}).{ext}"),
        (Some(stem), None) => format!("{stem}({counter})"),
        _ => format!("{file_name}({counter})"),
    }
}

fn falls_back_to_copy(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::CrossesDevices | io::ErrorKind::PermissionDenied
    )
}

#[async_trait]
impl FileRelocator for LocalFileRelocator {
    async fn exists(&self, path: &Path) -> bool {
        // symlink_metadata so dangling links still count as taken
        fs::symlink_metadata(path).await.is_ok()
    }

    async fn resolve_collision(&self, target: &Path) -> Result<PathBuf, RelocationError> {
        if !self.exists(target).await {
            return Ok(target.to_path_buf());
        }

        let file_name = target
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| RelocationError::NoFreeName(target.to_path_buf()))?;
        let directory = target.parent().unwrap_or_else(|| Path::new(""));

        for counter in 1..=MAX_COLLISION_SUFFIX {
            let candidate = directory.join(suffixed_name(file_name, counter));
            if !self.exists(&candidate).await {
                return Ok(candidate);
            }
        }

        Err(RelocationError::NoFreeName(target.to_path_buf()))
    }

    async fn relocate(&self, source: &Path, destination: &Path) -> Result<(), RelocationError> {
        if !self.exists(source).await {
            return Err(RelocationError::SourceMissing(source.to_path_buf()));
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| RelocationError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        move_file(source, destination, fs::rename(source, destination))
            .await
            .map_err(|e| RelocationError::Move {
                from: source.to_path_buf(),
                to: destination.to_path_buf(),
                source: e,
            })
    }
}

/// Awaits `rename` and, when the kernel refuses it, copies then removes.
async fn move_file<R>(source: &Path, destination: &Path, rename: R) -> io::Result<()>
where
    R: Future<Output = io::Result<()>>,
{
    match rename.await {
        Ok(()) => Ok(()),
        Err(e) if falls_back_to_copy(&e) => {
            tracing::debug!(
                error = %e,
                from = %source.display(),
                to = %destination.display(),
                "Rename not possible, copying instead"
            );
            // Not atomic: a crash between copy and remove leaves both files.
            fs::copy(source, destination).await?;
            fs::remove_file(source).await
        }
        Err(e) => Err(e),
    }
}
