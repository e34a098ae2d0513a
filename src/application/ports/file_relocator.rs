use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Moves staged files into the vault tree.
#[async_trait]
pub trait FileRelocator: Send + Sync {
    async fn exists(&self, path: &Path) -> bool;

    /// First non-existing candidate among `name.ext`, `name(1).ext`, ...
    async fn resolve_collision(&self, target: &Path) -> Result<PathBuf, RelocationError>;

    async fn relocate(&self, source: &Path, destination: &Path) -> Result<(), RelocationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RelocationError {
    #[error("staged upload is missing: {}", .0.display())]
    SourceMissing(PathBuf),
    #[error("no free name for {}", .0.display())]
    NoFreeName(PathBuf),
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDirectory { path: PathBuf, source: io::Error },
    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}
