use std::fmt;
use std::path::{Path, PathBuf};

/// A path inside the vault, relative to the storage root.
///
/// Accepts `/` and `\` separators, drops empty and `.` segments and rejects
/// `..` so the result can never climb out of the root it is joined onto.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VaultPath(Vec<String>);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultPathError {
    #[error("path escapes the storage root: {0}")]
    Traversal(String),
}

impl VaultPath {
    pub fn parse(raw: &str) -> Result<Self, VaultPathError> {
        let mut segments = Vec::new();
        for segment in raw.split(['/', '\\']) {
            match segment {
                "" | "." => continue,
                ".." => return Err(VaultPathError::Traversal(raw.to_string())),
                s if s.contains(':') => return Err(VaultPathError::Traversal(raw.to_string())),
                s => segments.push(s.to_string()),
            }
        }
        Ok(Self(segments))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn extension(&self) -> Option<String> {
        self.file_name()
            .map(Path::new)
            .and_then(Path::extension)
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
    }

    pub fn join(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }

    pub fn resolve(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.0);
        path
    }
}

impl fmt::Display for VaultPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// Reduces a client-supplied file name to its final path segment.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    raw.rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(String::from)
}
