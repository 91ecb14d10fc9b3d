//! Image decoding with content-based format detection.

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;

use crate::error::{LoadError, LoadResult};

/// Read and decode the image at `path`.
///
/// The format is sniffed from the bytes first, since cache files for the
/// original variant carry no extension; the extension is only a fallback.
pub fn decode_file(path: &Path) -> LoadResult<DynamicImage> {
    let bytes = std::fs::read(path).map_err(|e| LoadError::Decode {
        path: path.to_path_buf(),
        message: format!("Cannot read file: {}", e),
    })?;
    decode_bytes(bytes, path)
}

/// Decode an in-memory buffer; `path` is used for the fallback format and errors.
pub fn decode_bytes(bytes: Vec<u8>, path: &Path) -> LoadResult<DynamicImage> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| LoadError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot detect image format: {}", e),
        })?;

    let reader = if reader.format().is_some() {
        reader
    } else {
        let format = ImageFormat::from_path(path).map_err(|_| LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
            format: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
                .to_string(),
        })?;
        let mut reader = reader;
        reader.set_format(format);
        reader
    };

    reader.decode().map_err(|e| LoadError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
