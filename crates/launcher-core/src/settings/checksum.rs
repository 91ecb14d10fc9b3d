//! ROM checksums.

use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::SettingsError;

/// Computes the identifying checksum of a ROM file.
pub trait RomChecksum {
    /// Lowercase hex checksum of the ROM at `path`.
    fn checksum_rom(&self, path: &Path) -> Result<String, SettingsError>;
}

/// Plain SHA-1 over the file contents.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha1Checksum;

impl RomChecksum for Sha1Checksum {
    fn checksum_rom(&self, path: &Path) -> Result<String, SettingsError> {
        let checksum_error = |source| SettingsError::Checksum {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(checksum_error)?;
        let mut reader = BufReader::new(file);
        let mut hasher = Sha1::new();

        let mut buffer = [0u8; 65536];
        loop {
            let bytes_read = reader.read(&mut buffer).map_err(checksum_error)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }
}
