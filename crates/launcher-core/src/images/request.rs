//! Load request handles.
//!
//! A [`LoadRequest`] is owned by whoever called
//! [`ImageLoader::load_image`](super::ImageLoader::load_image), always behind an
//! `Arc`. The loader queue only keeps a `Weak`, so dropping every `Arc` before
//! the worker gets to the request cancels it without a trace.

use image::DynamicImage;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use super::source::ImageSource;

/// Completion callback, run once on the UI context with the filled request.
pub type OnLoad = Box<dyn FnOnce(Arc<LoadRequest>) + Send>;

/// Named options attached to a load request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Render as cover art (fixed thumbnail size, near-square covers squared)
    pub is_cover: bool,

    /// Free-form options carried along for the callback
    pub extra: BTreeMap<String, String>,
}

impl LoadOptions {
    /// Options for a cover thumbnail.
    pub fn cover() -> Self {
        Self {
            is_cover: true,
            ..Self::default()
        }
    }

    /// Attach a named option.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Look up a named option.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}

/// One image load, filled in by the loader worker.
pub struct LoadRequest {
    source: Option<ImageSource>,
    size: Option<(u32, u32)>,
    options: LoadOptions,
    on_load: Mutex<Option<OnLoad>>,
    image: OnceLock<DynamicImage>,
    error: OnceLock<String>,
}

impl LoadRequest {
    pub(crate) fn new(
        source: Option<ImageSource>,
        size: Option<(u32, u32)>,
        options: LoadOptions,
        on_load: Option<OnLoad>,
    ) -> Self {
        Self {
            source,
            size,
            options,
            on_load: Mutex::new(on_load),
            image: OnceLock::new(),
            error: OnceLock::new(),
        }
    }

    /// Where the image comes from, if anywhere.
    pub fn source(&self) -> Option<&ImageSource> {
        self.source.as_ref()
    }

    /// Requested output size; `None` keeps the natural size.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn is_cover(&self) -> bool {
        self.options.is_cover
    }

    /// The loaded image, once the worker has filled the request.
    pub fn image(&self) -> Option<&DynamicImage> {
        self.image.get()
    }

    pub fn is_filled(&self) -> bool {
        self.image.get().is_some()
    }

    /// Why the load failed, if it did.
    pub fn error(&self) -> Option<&str> {
        self.error.get().map(String::as_str)
    }

    pub(crate) fn set_image(&self, image: DynamicImage) {
        if self.image.set(image).is_err() {
            tracing::warn!("Load request for {:?} filled twice", self.source);
        }
    }

    pub(crate) fn set_error(&self, message: String) {
        let _ = self.error.set(message);
    }

    /// Take the callback, leaving nothing behind so it can only run once.
    pub(crate) fn take_on_load(&self) -> Option<OnLoad> {
        self.on_load
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl fmt::Debug for LoadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadRequest")
            .field("source", &self.source)
            .field("size", &self.size)
            .field("options", &self.options)
            .field("filled", &self.is_filled())
            .field("error", &self.error.get())
            .finish()
    }
}
