use std::fmt;

use super::VaultPath;

const DIGEST_HEX_LEN: usize = 16;

/// Cache file name for a thumbnail, always stored as PNG.
///
/// The readable part is the normalized source path with every character
/// outside `[A-Za-z0-9]` replaced by `_`. A blake3 digest of the normalized
/// path follows it, so two distinct sources never share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThumbnailKey(String);

impl ThumbnailKey {
    pub fn for_source(source: &VaultPath) -> Self {
        let normalized = source.to_string();
        let flattened: String = normalized
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let digest = blake3::hash(normalized.as_bytes()).to_hex();
        Self(format!("{flattened}-{}.png", &digest[..DIGEST_HEX_LEN]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThumbnailKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
