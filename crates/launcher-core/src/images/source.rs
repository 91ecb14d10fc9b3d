//! Where a load request takes its pixels from.

use std::fmt;
use std::path::PathBuf;

/// Prefix marking a path string as a content-hash reference.
pub const SHA1_PREFIX: &str = "sha1:";

/// Source of an image load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A file on the local filesystem, used as-is
    Path(PathBuf),
    /// A SHA-1 content hash, resolved through the image cache
    Sha1(String),
}

impl ImageSource {
    /// Parse a launcher path string.
    ///
    /// `sha1:<hash>` becomes [`ImageSource::Sha1`]; anything else is a direct
    /// filesystem path. Empty strings (and a bare `sha1:`) carry no source.
    pub fn parse(value: &str) -> Option<Self> {
        if let Some(hash) = value.strip_prefix(SHA1_PREFIX) {
            if hash.is_empty() {
                return None;
            }
            return Some(Self::Sha1(hash.to_string()));
        }
        if value.is_empty() {
            return None;
        }
        Some(Self::Path(PathBuf::from(value)))
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Sha1(hash) => write!(f, "{SHA1_PREFIX}{hash}"),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}
