//! Client for the remote image service.
//!
//! The service answers `GET http://{server}/image/{hash}{query}` with the raw
//! image bytes. No content-type negotiation takes place and no timeout is set,
//! so a stalled server stalls the loader worker.

use async_trait::async_trait;
use futures_util::StreamExt;

use super::cache::CacheVariant;
use crate::error::{LoadError, LoadResult};

/// Upper bound on the body buffer reserved up front.
const MAX_PREALLOC: u64 = 4 * 1024 * 1024;

/// Something that can download image bytes by URL.
///
/// Uses `async_trait` so the loader can hold an `Arc<dyn ImageFetcher>`.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Download the full response body for `url`.
    async fn fetch(&self, url: &str) -> LoadResult<Vec<u8>>;
}

/// Build the image service URL for a hash and rendering variant.
pub fn image_url(server: &str, hash: &str, variant: &CacheVariant) -> String {
    format!("http://{}/image/{}{}", server, hash, variant.query())
}

/// HTTP fetcher backed by `reqwest`.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn error(url: &str, err: reqwest::Error) -> LoadError {
        LoadError::Fetch {
            url: url.to_string(),
            message: err.to_string(),
            status_code: err.status().map(|s| s.as_u16()),
        }
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> LoadResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Fetch {
                url: url.to_string(),
                message: format!("HTTP {status}"),
                status_code: Some(status.as_u16()),
            });
        }

        // Content-Length is a hint only.
        let capacity = response.content_length().unwrap_or(0).min(MAX_PREALLOC) as usize;
        let mut body = Vec::with_capacity(capacity);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Self::error(url, e))?;
            body.extend_from_slice(&chunk);
        }

        tracing::debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}
