//! Easel Image
//!
//! Image decoding for textured drawing.
//!
//! # Features
//!
//! - Load images from file paths, raw bytes, or pre-decoded RGBA pixels
//! - Support for PNG, JPEG, GIF, WebP, BMP formats
//! - Animated GIFs decode into an ordered frame list with per-frame delays and
//!   the loop count stored in the file
//!
//! # Example
//!
//! ```ignore
//! use easel_image::{DecodedImage, ImageSource};
//!
//! let decoded = DecodedImage::decode(&ImageSource::file("spinner.gif"))?;
//! if decoded.is_animated() {
//!     println!("{} frames, loop count {}", decoded.frame_count(), decoded.loop_count());
//! }
//! ```

mod decode;
mod error;
mod source;

pub use decode::{flip_rows, DecodedFrame, DecodedImage, DEFAULT_FRAME_DELAY};
pub use error::{ImageError, Result};
pub use image::RgbaImage;
pub use source::{ImageFormat, ImageSource};
