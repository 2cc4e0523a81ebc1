//! Decoding sources into still or animated RGBA data

use std::io::Cursor;
use std::time::Duration;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, RgbaImage};

use crate::error::{ImageError, Result};
use crate::source::{ImageFormat, ImageSource};

/// Delay used for frames that declare a zero delay
pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(100);

/// One frame of an animated image
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub image: RgbaImage,
    pub delay: Duration,
}

/// A decoded image, either a single picture or an ordered frame sequence
#[derive(Debug, Clone)]
pub enum DecodedImage {
    Still(RgbaImage),
    Animated {
        frames: Vec<DecodedFrame>,
        /// -1 loops forever, 0 plays once and holds, N > 0 repeats N times
        loop_count: i32,
    },
}

impl DecodedImage {
    /// Decode an image from any supported source
    pub fn decode(source: &ImageSource) -> Result<Self> {
        match source {
            ImageSource::File(path) => {
                let data = std::fs::read(path).map_err(|source| ImageError::Io {
                    path: path.clone(),
                    source,
                })?;
                let hint = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .and_then(ImageFormat::from_extension);
                Self::decode_bytes(&data, hint)
            }
            ImageSource::Bytes { data, format } => Self::decode_bytes(data, *format),
            ImageSource::Rgba {
                data,
                width,
                height,
            } => {
                let expected = *width as usize * *height as usize * 4;
                RgbaImage::from_raw(*width, *height, data.clone())
                    .map(DecodedImage::Still)
                    .ok_or(ImageError::RgbaSize {
                        width: *width,
                        height: *height,
                        expected,
                        actual: data.len(),
                    })
            }
        }
    }

    /// Decode encoded bytes, guessing the format when no hint is given
    pub fn decode_bytes(data: &[u8], hint: Option<ImageFormat>) -> Result<Self> {
        let format = match hint {
            Some(format) => format.to_image_format(),
            None => image::guess_format(data)?,
        };

        if format == image::ImageFormat::Gif {
            return Self::decode_gif(data);
        }

        let image = image::load_from_memory_with_format(data, format)?.to_rgba8();
        Ok(DecodedImage::Still(image))
    }

    fn decode_gif(data: &[u8]) -> Result<Self> {
        let decoder = GifDecoder::new(Cursor::new(data))?;
        let mut frames: Vec<DecodedFrame> = decoder
            .into_frames()
            .collect_frames()?
            .into_iter()
            .map(|frame| {
                let (numer, denom) = frame.delay().numer_denom_ms();
                let millis = if denom == 0 { 0 } else { numer / denom };
                let delay = if millis == 0 {
                    DEFAULT_FRAME_DELAY
                } else {
                    Duration::from_millis(u64::from(millis))
                };
                DecodedFrame {
                    image: frame.into_buffer(),
                    delay,
                }
            })
            .collect();

        match frames.len() {
            0 => Err(ImageError::NoFrames),
            1 => Ok(DecodedImage::Still(frames.remove(0).image)),
            count => {
                let loop_count = gif_loop_count(data);
                tracing::debug!(frames = count, loop_count, "decoded animated gif");
                Ok(DecodedImage::Animated { frames, loop_count })
            }
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, DecodedImage::Animated { .. })
    }

    pub fn frame_count(&self) -> usize {
        match self {
            DecodedImage::Still(_) => 1,
            DecodedImage::Animated { frames, .. } => frames.len(),
        }
    }

    /// Loop count of an animation; still images report 0
    pub fn loop_count(&self) -> i32 {
        match self {
            DecodedImage::Still(_) => 0,
            DecodedImage::Animated { loop_count, .. } => *loop_count,
        }
    }

    /// Width and height of the first frame
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            DecodedImage::Still(image) => image.dimensions(),
            DecodedImage::Animated { frames, .. } => frames
                .first()
                .map(|frame| frame.image.dimensions())
                .unwrap_or((0, 0)),
        }
    }
}

/// Copy of `image` with its rows in reverse order.
///
/// Decoders produce the top row first; texture uploads expect the bottom row
/// first so that texture coordinate (0, 0) is the bottom-left corner.
pub fn flip_rows(image: &RgbaImage) -> RgbaImage {
    image::imageops::flip_vertical(image)
}

/// Read the NETSCAPE2.0 application extension.
///
/// The stored value counts repeats with 0 meaning forever; a missing block
/// means the animation plays once.
fn gif_loop_count(data: &[u8]) -> i32 {
    const IDENTS: [&[u8]; 2] = [b"NETSCAPE2.0", b"ANIMEXTS1.0"];

    for ident in IDENTS {
        let Some(pos) = data.windows(ident.len()).position(|w| w == ident) else {
            continue;
        };
        let block = &data[pos + ident.len()..];
        if let [3, 1, lo, hi, ..] = *block {
            return match u16::from_le_bytes([lo, hi]) {
                0 => -1,
                n => i32::from(n),
            };
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_count_block() {
        let mut data = b"GIF89a....!\xFF\x0B".to_vec();
        data.extend_from_slice(b"NETSCAPE2.0");
        data.extend_from_slice(&[3, 1, 5, 0, 0]);
        assert_eq!(gif_loop_count(&data), 5);

        let forever = [b"NETSCAPE2.0".as_slice(), &[3, 1, 0, 0, 0]].concat();
        assert_eq!(gif_loop_count(&forever), -1);

        assert_eq!(gif_loop_count(b"GIF89a no extension"), 0);
    }

    #[test]
    fn test_rgba_source_size_mismatch() {
        let source = ImageSource::rgba(vec![0; 12], 2, 2);
        let err = DecodedImage::decode(&source).unwrap_err();
        assert!(matches!(err, ImageError::RgbaSize { expected: 16, actual: 12, .. }));
    }

    #[test]
    fn test_rgba_source_is_still() {
        let source = ImageSource::rgba(vec![255; 16], 2, 2);
        let decoded = DecodedImage::decode(&source).unwrap();
        assert!(!decoded.is_animated());
        assert_eq!(decoded.dimensions(), (2, 2));
        assert_eq!(decoded.loop_count(), 0);
    }

    #[test]
    fn test_flip_rows() {
        let mut picture = RgbaImage::new(1, 2);
        picture.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        picture.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));
        let flipped = flip_rows(&picture);
        assert_eq!(flipped.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(flipped.get_pixel(0, 1).0, [255, 0, 0, 255]);
    }
}
