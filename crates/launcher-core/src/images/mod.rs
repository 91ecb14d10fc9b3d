//! Asynchronous image loading for the launcher UI.
//!
//! - **source**: `sha1:` references versus plain paths
//! - **cache**: content-addressed on-disk cache with atomic writes
//! - **fetch**: client for the remote image service
//! - **decode**: format sniffing and decoding
//! - **resize**: cover squaring and pixel-art upscaling policy
//! - **request**: weakly queued, callback-carrying request handles
//! - **loader**: the single background worker tying it all together

pub mod cache;
pub mod decode;
pub mod fetch;
pub mod loader;
pub mod request;
pub mod resize;
pub mod source;

pub use cache::{CacheVariant, ImageCache};
pub use decode::decode_file;
pub use fetch::{image_url, HttpFetcher, ImageFetcher};
pub use loader::ImageLoader;
pub use request::{LoadOptions, LoadRequest, OnLoad};
pub use resize::{apply_plan, plan_resize, ResizePlan};
pub use source::ImageSource;
