//! Launcher Core - image loading and kickstart settings for the emulator launcher.
//!
//! Covers and screenshots are referenced either by local path or by
//! `sha1:<hash>` into a content-addressed image service. The
//! [`ImageLoader`] resolves them on a single background thread, caches
//! downloads on disk and hands finished images back to the UI thread.
//!
//! # Architecture
//!
//! ```text
//! load_image → queue (weak) → worker: cache/fetch → decode → resize → UI dispatch
//! ```
//!
//! Settings live in an observable [`ConfigStore`]; the [`KickstartPanel`]
//! is the headless model of the kickstart ROM settings group.
//!
//! # Usage
//!
//! ```rust,ignore
//! use launcher_core::{ui_channel, Config, ImageLoader, ImageSource, LoadOptions};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> launcher_core::Result<()> {
//!     let config = Config::load()?;
//!     let (ui, mut run_loop) = ui_channel();
//!     let loader = ImageLoader::new(&config, Arc::new(ui))?;
//!
//!     let source = ImageSource::parse("sha1:3a1f...");
//!     let request = loader.load_image(
//!         source,
//!         None,
//!         LoadOptions::cover(),
//!         Some(Box::new(|req| println!("loaded: {}", req.is_filled()))),
//!     );
//!     run_loop.run_next().await;
//!     drop(request);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod context;
pub mod error;
pub mod images;
pub mod settings;
pub mod signal;
pub mod ui;

#[cfg(test)]
mod test_support;

// Re-exports for convenient access
pub use config::Config;
pub use context::LauncherContext;
pub use error::{ConfigError, LauncherError, LoadError, LoadResult, Result, SettingsError};
pub use images::{
    CacheVariant, HttpFetcher, ImageCache, ImageFetcher, ImageLoader, ImageSource, LoadOptions,
    LoadRequest, OnLoad,
};
pub use settings::{ConfigStore, KickstartMode, KickstartPanel, Sha1Checksum};
pub use signal::{SignalBus, QUIT};
pub use ui::{ui_channel, UiDispatcher, UiHandle, UiRunLoop, UiTask};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
