//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.images.server.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "images.server must not be empty".into(),
            ));
        }
        if self.images.server.contains('/') {
            return Err(ConfigError::ValidationError(
                "images.server must be a host name, not a URL".into(),
            ));
        }
        if self.images.cover_width == 0 {
            return Err(ConfigError::ValidationError(
                "images.cover_width must be > 0".into(),
            ));
        }
        if self.images.cover_height == 0 {
            return Err(ConfigError::ValidationError(
                "images.cover_height must be > 0".into(),
            ));
        }
        if self.images.upscale_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "images.upscale_threshold must be > 0".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(
                "logging.format must be \"pretty\" or \"json\"".into(),
            ));
        }
        Ok(())
    }
}
