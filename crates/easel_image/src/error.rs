//! Image error types

use std::path::PathBuf;
use thiserror::Error;

/// Image loading errors
#[derive(Error, Debug)]
pub enum ImageError {
    /// Failed to read the source file
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes could not be decoded
    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    /// Pre-decoded RGBA data does not match its declared size
    #[error("RGBA buffer holds {actual} bytes but {width}x{height} needs {expected}")]
    RgbaSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// An animated image with no frames
    #[error("Animated image contains no frames")]
    NoFrames,
}

/// Result type for image operations
pub type Result<T> = std::result::Result<T, ImageError>;
