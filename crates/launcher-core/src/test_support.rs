//! Shared fixtures for unit tests.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::sync::{mpsc, Mutex};

use crate::error::{LoadError, LoadResult};
use crate::images::ImageFetcher;

/// PNG-encoded black image of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::new_rgb8(width, height);
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// Fetcher that serves a fixed body (or fails) and records requested URLs.
pub struct MockFetcher {
    body: Option<Vec<u8>>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn serving(body: Vec<u8>) -> Self {
        Self {
            body: Some(body),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            body: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> LoadResult<Vec<u8>> {
        self.calls.lock().unwrap().push(url.to_string());
        match &self.body {
            Some(body) => Ok(body.clone()),
            None => Err(LoadError::Fetch {
                url: url.to_string(),
                message: "HTTP 503 Service Unavailable".to_string(),
                status_code: Some(503),
            }),
        }
    }
}

/// Fetcher that blocks the calling thread on its first fetch until released.
///
/// Used to hold the loader worker in the middle of a fill.
pub struct GatedFetcher {
    body: Vec<u8>,
    started: Mutex<Option<mpsc::Sender<()>>>,
    release: Mutex<mpsc::Receiver<()>>,
}

/// Test-side controls for a [`GatedFetcher`].
pub struct Gate {
    pub started: mpsc::Receiver<()>,
    pub release: mpsc::Sender<()>,
}

impl GatedFetcher {
    pub fn new(body: Vec<u8>) -> (Self, Gate) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let fetcher = Self {
            body,
            started: Mutex::new(Some(started_tx)),
            release: Mutex::new(release_rx),
        };
        let gate = Gate {
            started: started_rx,
            release: release_tx,
        };
        (fetcher, gate)
    }
}

#[async_trait]
impl ImageFetcher for GatedFetcher {
    async fn fetch(&self, _url: &str) -> LoadResult<Vec<u8>> {
        let started = self.started.lock().unwrap().take();
        if let Some(started) = started {
            let _ = started.send(());
            let _ = self.release.lock().unwrap().recv();
        }
        Ok(self.body.clone())
    }
}

/// Fetcher that panics, to exercise the worker's fault isolation.
pub struct PanickingFetcher;

#[async_trait]
impl ImageFetcher for PanickingFetcher {
    async fn fetch(&self, _url: &str) -> LoadResult<Vec<u8>> {
        panic!("fetcher exploded");
    }
}
