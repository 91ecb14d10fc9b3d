//! Configuration management for the launcher.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. All config structs implement `Default`, so a missing file or a
//! partial file both produce a usable configuration.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for the launcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Image loader and cover cache settings
    pub images: ImagesConfig,

    /// Kickstart ROM settings
    pub kickstarts: KickstartsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/net.fs-uae.launcher/config.toml
    /// - Linux: ~/.config/launcher/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\fs-uae\launcher\config\config.toml
    ///
    /// Falls back to ~/.launcher/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("net", "fs-uae", "launcher")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".launcher").join("config.toml")
            })
    }

    /// Get the resolved base directory (with ~ expansion).
    pub fn base_dir(&self) -> PathBuf {
        expand(&self.general.base_dir)
    }

    /// Get the resolved image cache root.
    pub fn image_cache_dir(&self) -> PathBuf {
        if self.images.cache_dir.as_os_str().is_empty() {
            self.base_dir().join("Cache").join("Images")
        } else {
            expand(&self.images.cache_dir)
        }
    }

    /// Get the resolved kickstarts directory.
    pub fn kickstarts_dir(&self) -> PathBuf {
        if self.kickstarts.dir.as_os_str().is_empty() {
            self.base_dir().join("Kickstarts")
        } else {
            expand(&self.kickstarts.dir)
        }
    }

    /// Get the resolved settings store file.
    pub fn settings_file(&self) -> PathBuf {
        if self.kickstarts.settings_file.as_os_str().is_empty() {
            self.base_dir().join("launcher-settings.toml")
        } else {
            expand(&self.kickstarts.settings_file)
        }
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(&path_str);
    PathBuf::from(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.images.server, "oagd.net");
        assert_eq!(config.images.cover_size(), (117, 165));
        assert_eq!(config.images.upscale_threshold, 400);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[images]"));
        assert!(toml.contains("[kickstarts]"));
    }

    #[test]
    fn test_derived_dirs_follow_base_dir() {
        let mut config = Config::default();
        config.general.base_dir = PathBuf::from("/data/launcher");
        assert_eq!(
            config.image_cache_dir(),
            PathBuf::from("/data/launcher/Cache/Images")
        );
        assert_eq!(
            config.kickstarts_dir(),
            PathBuf::from("/data/launcher/Kickstarts")
        );
        assert_eq!(
            config.settings_file(),
            PathBuf::from("/data/launcher/launcher-settings.toml")
        );
    }

    #[test]
    fn test_explicit_cache_dir_wins() {
        let mut config = Config::default();
        config.images.cache_dir = PathBuf::from("/var/cache/covers");
        assert_eq!(config.image_cache_dir(), PathBuf::from("/var/cache/covers"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[images]\nserver = \"localhost:8000\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.images.server, "localhost:8000");
        assert_eq!(config.images.cover_width, 117);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[images]\ncover_width = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("cover_width"));
    }
}
