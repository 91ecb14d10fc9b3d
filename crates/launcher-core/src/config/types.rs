//! Sub-configuration structs with the launcher's defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Launcher data directory; other directories default to children of it
    pub base_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("~/.launcher"),
        }
    }
}

/// Image loading and cover cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Host (and optional port) of the remote image service
    pub server: String,

    /// Root of the content-addressed image cache.
    /// Empty means `<base_dir>/Cache/Images`.
    pub cache_dir: PathBuf,

    /// Width requested from the service for cover thumbnails
    pub cover_width: u32,

    /// Height requested from the service for cover thumbnails
    pub cover_height: u32,

    /// Non-cover images narrower than this are doubled (nearest-neighbour)
    /// before the final smooth resize
    pub upscale_threshold: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            server: "oagd.net".to_string(),
            cache_dir: PathBuf::new(),
            cover_width: 117,
            cover_height: 165,
            upscale_threshold: 400,
        }
    }
}

impl ImagesConfig {
    /// Cover thumbnail dimensions as `(width, height)`.
    pub fn cover_size(&self) -> (u32, u32) {
        (self.cover_width, self.cover_height)
    }
}

/// Kickstart ROM settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KickstartsConfig {
    /// Directory scanned for kickstart ROMs.
    /// Empty means `<base_dir>/Kickstarts`.
    pub dir: PathBuf,

    /// File holding the persisted launcher settings store.
    /// Empty means `<base_dir>/launcher-settings.toml`.
    pub settings_file: PathBuf,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
