//! Content-addressed on-disk image cache.
//!
//! Images are keyed by their SHA-1 hash plus a rendering variant and stored
//! under a two-character shard directory:
//!
//! ```text
//! <root>/ab/abc123                      original
//! <root>/ab/abc123_1x.png               scaled for an explicit size
//! <root>/ab/abc123_117x165_lbcover.png  cover thumbnail
//! ```
//!
//! A file under its final name is always complete: downloads land in a
//! uniquely named `.partial` file first and are renamed into place, so two
//! concurrent fetches of the same entry race harmlessly.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::fetch::{image_url, ImageFetcher};
use crate::config::ImagesConfig;
use crate::error::{LoadError, LoadResult};

/// Length of the random token in temporary download names.
const PARTIAL_TOKEN_LEN: usize = 8;

/// A distinct rendering of one source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheVariant {
    /// The image exactly as uploaded
    Original,
    /// The service's generic scaled rendering, used for explicit sizes
    Scaled,
    /// A cover thumbnail at fixed dimensions
    Cover { width: u32, height: u32 },
}

impl CacheVariant {
    /// Pick the variant for a request. Cover mode wins over an explicit size.
    pub fn for_request(size: Option<(u32, u32)>, is_cover: bool, cover_size: (u32, u32)) -> Self {
        if is_cover {
            Self::Cover {
                width: cover_size.0,
                height: cover_size.1,
            }
        } else if size.is_some() {
            Self::Scaled
        } else {
            Self::Original
        }
    }

    /// Query string sent to the image service.
    pub fn query(&self) -> String {
        match self {
            Self::Original => String::new(),
            Self::Scaled => "?s=1x".to_string(),
            Self::Cover { width, height } => format!("?w={width}&h={height}&t=lbcover"),
        }
    }

    /// Cache file name for `hash` in this variant.
    pub fn file_name(&self, hash: &str) -> String {
        match self {
            Self::Original => hash.to_string(),
            Self::Scaled => format!("{hash}_1x.png"),
            Self::Cover { width, height } => format!("{hash}_{width}x{height}_lbcover.png"),
        }
    }
}

/// On-disk cache in front of the remote image service.
pub struct ImageCache {
    root: PathBuf,
    server: String,
    cover_size: (u32, u32),
    fetcher: Arc<dyn ImageFetcher>,
}

impl ImageCache {
    /// Create a cache rooted at `root`, fetching misses from the configured server.
    pub fn new(root: PathBuf, config: &ImagesConfig, fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            root,
            server: config.server.clone(),
            cover_size: config.cover_size(),
            fetcher,
        }
    }

    /// Root directory of the cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Variant used for a request with the given size and cover flag.
    pub fn variant_for(&self, size: Option<(u32, u32)>, is_cover: bool) -> CacheVariant {
        CacheVariant::for_request(size, is_cover, self.cover_size)
    }

    /// Shard directory holding every variant of `hash`.
    pub fn dir_for_hash(&self, hash: &str) -> PathBuf {
        let shard = hash.get(..2).unwrap_or(hash);
        self.root.join(shard)
    }

    /// Final cache path for `hash` in `variant`. Does not touch the disk.
    pub fn cache_path(&self, hash: &str, variant: &CacheVariant) -> LoadResult<PathBuf> {
        validate_hash(hash)?;
        Ok(self.dir_for_hash(hash).join(variant.file_name(hash)))
    }

    /// Return a local file holding `hash` in `variant`, downloading it on a miss.
    ///
    /// A zero-byte file under the final name is treated as a miss.
    pub async fn resolve(&self, hash: &str, variant: &CacheVariant) -> LoadResult<PathBuf> {
        let cache_file = self.cache_path(hash, variant)?;

        match tokio::fs::metadata(&cache_file).await {
            Ok(meta) if meta.len() > 0 => {
                tracing::debug!("Cache hit: {:?}", cache_file);
                return Ok(cache_file);
            }
            Ok(_) => {
                tracing::warn!("Ignoring empty cache file {:?}, fetching again", cache_file);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(LoadError::cache(&cache_file, e)),
        }

        let url = image_url(&self.server, hash, variant);
        tracing::info!("Fetching {}", url);
        let data = self.fetcher.fetch(&url).await?;

        self.store(&cache_file, &data).await?;
        Ok(cache_file)
    }

    /// Write `data` to a temporary sibling of `cache_file` and rename it into place.
    async fn store(&self, cache_file: &Path, data: &[u8]) -> LoadResult<()> {
        let partial = partial_path(cache_file);
        if let Some(parent) = partial.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LoadError::cache(parent, e))?;
        }

        tokio::fs::write(&partial, data)
            .await
            .map_err(|e| LoadError::cache(&partial, e))?;

        if let Err(e) = tokio::fs::rename(&partial, cache_file).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(LoadError::cache(cache_file, e));
        }

        tracing::debug!("Cached {} bytes at {:?}", data.len(), cache_file);
        Ok(())
    }
}

/// `<final>.<token>.partial` next to the final cache file.
fn partial_path(cache_file: &Path) -> PathBuf {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PARTIAL_TOKEN_LEN)
        .map(char::from)
        .collect();
    let mut name = cache_file.as_os_str().to_owned();
    name.push(format!(".{token}.partial"));
    PathBuf::from(name)
}

/// Hashes become path components, so they must not escape the cache root.
fn validate_hash(hash: &str) -> LoadResult<()> {
    if hash.is_empty() || hash.contains(['/', '\\']) || hash.contains("..") {
        return Err(LoadError::Cache {
            path: PathBuf::from(hash),
            source: io::Error::new(io::ErrorKind::InvalidInput, "invalid content hash"),
        });
    }
    Ok(())
}
