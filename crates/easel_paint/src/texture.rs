//! Named textures and their playback cursors
//!
//! Images are queued by name and uploaded later on the rendering thread.
//! Still images become one texture. Animated images become an
//! [`AnimatedFrameSet`] with one texture per frame, plus a shared cursor that
//! name-based draws follow; each call to [`TextureRegistry::handler`] adds an
//! independent cursor over the same frames.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use easel_animation::{AnimatedFrameSet, AnimationFrame, CursorArena, CursorId, PlaybackCursor};
use easel_core::TextureId;
use easel_image::{flip_rows, DecodedImage, ImageSource, RgbaImage};

use crate::backend::{RasterBackend, TextureUpload};
use crate::error::{PaintError, Result};
use crate::shape::TextureBinding;

/// An uploaded still image
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StillTexture {
    pub texture: TextureId,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug)]
enum LoadedImage {
    Still(StillTexture),
    Animated {
        frames: Arc<AnimatedFrameSet>,
        shared: CursorId,
    },
}

/// What a draw call samples: a still texture or one playback cursor
#[derive(Clone, Debug)]
pub enum TextureHandler {
    Still(StillTexture),
    Animated {
        id: CursorId,
        cursor: Arc<PlaybackCursor>,
    },
}

impl TextureHandler {
    pub fn current_texture(&self) -> TextureId {
        match self {
            TextureHandler::Still(still) => still.texture,
            TextureHandler::Animated { cursor, .. } => cursor.current_texture(),
        }
    }

    /// Pixel size of the image currently shown
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            TextureHandler::Still(still) => (still.width, still.height),
            TextureHandler::Animated { cursor, .. } => cursor.current_frame().image.dimensions(),
        }
    }

    pub fn binding(&self) -> TextureBinding {
        match self {
            TextureHandler::Still(still) => TextureBinding::Static(still.texture),
            TextureHandler::Animated { cursor, .. } => TextureBinding::animated(cursor),
        }
    }

    pub fn cursor(&self) -> Option<&Arc<PlaybackCursor>> {
        match self {
            TextureHandler::Still(_) => None,
            TextureHandler::Animated { cursor, .. } => Some(cursor),
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, TextureHandler::Animated { .. })
    }
}

/// A texture named in the registry or an explicit handler
#[derive(Clone, Copy, Debug)]
pub enum TextureRef<'a> {
    Name(&'a str),
    Handler(&'a TextureHandler),
}

impl<'a> From<&'a str> for TextureRef<'a> {
    fn from(name: &'a str) -> Self {
        TextureRef::Name(name)
    }
}

impl<'a> From<&'a String> for TextureRef<'a> {
    fn from(name: &'a String) -> Self {
        TextureRef::Name(name)
    }
}

impl<'a> From<&'a TextureHandler> for TextureRef<'a> {
    fn from(handler: &'a TextureHandler) -> Self {
        TextureRef::Handler(handler)
    }
}

fn upload(backend: &mut dyn RasterBackend, image: &RgbaImage) -> Result<TextureId> {
    let flipped = flip_rows(image);
    let (width, height) = flipped.dimensions();
    Ok(backend.create_texture(&TextureUpload::new(width, height, flipped.as_raw()))?)
}

/// Textures by name plus the cursors playing them
#[derive(Debug)]
pub struct TextureRegistry {
    queued: Vec<(String, ImageSource)>,
    loaded: FxHashMap<String, LoadedImage>,
    cursors: CursorArena,
}

impl TextureRegistry {
    pub fn new(cursors: CursorArena) -> Self {
        Self {
            queued: Vec::new(),
            loaded: FxHashMap::default(),
            cursors,
        }
    }

    /// Queue `source` for loading under `name`, replacing an earlier queue entry
    pub fn queue(&mut self, name: impl Into<String>, source: ImageSource) {
        let name = name.into();
        self.queued.retain(|(queued, _)| *queued != name);
        self.queued.push((name, source));
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Decode and upload everything queued. Failures are logged and leave the
    /// name unresolved. Returns how many textures loaded.
    pub fn load_queued(&mut self, backend: &mut dyn RasterBackend) -> usize {
        let queued = std::mem::take(&mut self.queued);
        let mut loaded = 0;
        for (name, source) in queued {
            let result = DecodedImage::decode(&source)
                .map_err(PaintError::from)
                .and_then(|decoded| self.insert_decoded(&name, decoded, backend));
            match result {
                Ok(()) => loaded += 1,
                Err(err) => tracing::warn!(
                    texture = %name,
                    source = %source.describe(),
                    error = %err,
                    "failed to load texture"
                ),
            }
        }
        loaded
    }

    /// Upload an already decoded image under `name`
    pub fn insert_decoded(
        &mut self,
        name: &str,
        decoded: DecodedImage,
        backend: &mut dyn RasterBackend,
    ) -> Result<()> {
        let image = match decoded {
            DecodedImage::Still(image) => {
                let texture = upload(backend, &image)?;
                LoadedImage::Still(StillTexture {
                    texture,
                    width: image.width(),
                    height: image.height(),
                })
            }
            DecodedImage::Animated { frames, loop_count } => {
                let mut uploaded = Vec::with_capacity(frames.len());
                for frame in frames {
                    let texture = upload(backend, &frame.image)?;
                    uploaded.push(AnimationFrame {
                        image: frame.image,
                        delay: frame.delay,
                        texture,
                    });
                }
                let frames = Arc::new(AnimatedFrameSet::new(uploaded, loop_count)?);
                let shared = self.cursors.insert(Arc::clone(&frames));
                LoadedImage::Animated { frames, shared }
            }
        };

        tracing::debug!(
            texture = name,
            animated = matches!(image, LoadedImage::Animated { .. }),
            "texture loaded"
        );
        if let Some(LoadedImage::Animated { shared, .. }) =
            self.loaded.insert(name.to_string(), image)
        {
            self.cursors.remove(shared);
        }
        Ok(())
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    /// A handler for drawing `name`: the still image, or a fresh stopped
    /// cursor for animated images. `None` until the name is loaded.
    ///
    /// The cursor lives as long as the handler and its clones; once they are
    /// dropped its tick task stops and [`prune_cursors`](Self::prune_cursors)
    /// reclaims the entry.
    pub fn handler(&mut self, name: &str) -> Option<TextureHandler> {
        let frames = match self.loaded.get(name)? {
            LoadedImage::Still(still) => return Some(TextureHandler::Still(*still)),
            LoadedImage::Animated { frames, .. } => Arc::clone(frames),
        };
        let (id, cursor) = self.cursors.lease(frames);
        Some(TextureHandler::Animated { id, cursor })
    }

    /// The handler name-based draws use
    pub fn shared_handler(&self, name: &str) -> Option<TextureHandler> {
        match self.loaded.get(name)? {
            LoadedImage::Still(still) => Some(TextureHandler::Still(*still)),
            LoadedImage::Animated { shared, .. } => {
                let cursor = self.cursors.cursor(*shared)?;
                Some(TextureHandler::Animated { id: *shared, cursor })
            }
        }
    }

    pub fn resolve(&self, texture: TextureRef<'_>) -> Option<TextureHandler> {
        match texture {
            TextureRef::Name(name) => {
                let handler = self.shared_handler(name);
                if handler.is_none() {
                    tracing::debug!(texture = name, "texture not loaded");
                }
                handler
            }
            TextureRef::Handler(handler) => Some(handler.clone()),
        }
    }

    /// Start playback; false for still images and released cursors
    pub fn start(&mut self, handler: &TextureHandler) -> bool {
        match handler {
            TextureHandler::Animated { id, .. } => self.cursors.start(*id),
            TextureHandler::Still(_) => false,
        }
    }

    pub fn stop(&mut self, handler: &TextureHandler) -> bool {
        match handler {
            TextureHandler::Animated { id, .. } => self.cursors.stop(*id),
            TextureHandler::Still(_) => false,
        }
    }

    pub fn reset(&self, handler: &TextureHandler) -> bool {
        match handler {
            TextureHandler::Animated { id, .. } => self.cursors.reset(*id),
            TextureHandler::Still(_) => false,
        }
    }

    /// Stop and forget a cursor made by [`handler`](Self::handler). Shared
    /// cursors stay with their image.
    pub fn release(&mut self, handler: &TextureHandler) -> bool {
        let TextureHandler::Animated { id, .. } = handler else {
            return false;
        };
        let shared = self
            .loaded
            .values()
            .any(|image| matches!(image, LoadedImage::Animated { shared, .. } if shared == id));
        if shared {
            return false;
        }
        self.cursors.remove(*id).is_some()
    }

    /// Forget cursors whose handlers were all dropped
    pub fn prune_cursors(&mut self) -> usize {
        self.cursors.prune()
    }

    pub fn cursors(&self) -> &CursorArena {
        &self.cursors
    }
}
