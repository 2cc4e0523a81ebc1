//! Shared, immutable animation frame data

use std::time::Duration;

use easel_core::TextureId;
use easel_image::RgbaImage;

use crate::error::{AnimationError, Result};

/// One decoded frame with its display delay and backend texture
#[derive(Debug, Clone)]
pub struct AnimationFrame {
    pub image: RgbaImage,
    pub delay: Duration,
    pub texture: TextureId,
}

/// The decoded frames of one animated source image.
///
/// Built once on the rendering thread (textures are created there) and never
/// mutated afterwards; cursors hold it through `Arc`.
#[derive(Debug)]
pub struct AnimatedFrameSet {
    frames: Vec<AnimationFrame>,
    loop_count: i32,
}

impl AnimatedFrameSet {
    /// `loop_count`: -1 loops forever, 0 plays once and holds, N > 0 repeats N times
    pub fn new(frames: Vec<AnimationFrame>, loop_count: i32) -> Result<Self> {
        if frames.is_empty() {
            return Err(AnimationError::NoFrames);
        }
        Ok(Self { frames, loop_count })
    }

    pub fn loop_count(&self) -> i32 {
        self.loop_count
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false; construction rejects empty sets
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.frames.len() - 1
    }

    /// Frame at `index`, clamped to the last frame
    pub fn frame(&self, index: usize) -> &AnimationFrame {
        &self.frames[index.min(self.last_index())]
    }

    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    /// Total duration of one pass through every frame
    pub fn cycle_duration(&self) -> Duration {
        self.frames.iter().map(|frame| frame.delay).sum()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Arc;

    /// A frame set with 1x1 frames and the given delays in milliseconds
    pub fn frame_set(delays_ms: &[u64], loop_count: i32) -> Arc<AnimatedFrameSet> {
        let frames = delays_ms
            .iter()
            .enumerate()
            .map(|(i, ms)| AnimationFrame {
                image: RgbaImage::new(1, 1),
                delay: Duration::from_millis(*ms),
                texture: TextureId(100 + i as u32),
            })
            .collect();
        Arc::new(AnimatedFrameSet::new(frames, loop_count).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::frame_set;
    use super::*;

    #[test]
    fn test_empty_frame_set_rejected() {
        assert_eq!(
            AnimatedFrameSet::new(Vec::new(), 0).unwrap_err(),
            AnimationError::NoFrames
        );
    }

    #[test]
    fn test_frame_lookup_clamps() {
        let set = frame_set(&[10, 20, 30], -1);
        assert_eq!(set.len(), 3);
        assert_eq!(set.frame(1).texture, TextureId(101));
        assert_eq!(set.frame(99).texture, TextureId(102));
        assert_eq!(set.cycle_duration(), Duration::from_millis(60));
    }
}
