//! Retained shape objects
//!
//! A [`Shape`] is everything the canvas keeps between a draw call and the next
//! paint. Rasterizing one leaves the backend in the state it found it.

use std::sync::{Arc, Weak};

use easel_animation::PlaybackCursor;
use easel_core::{Color, TextureId};

use crate::backend::{ClientArray, RasterBackend, TextureBlend};
use crate::buffer::ShapeBuffer;
use crate::text::TextShape;
use crate::view::ViewTransform;

/// Depth-test toggle drawn between shapes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DepthTest {
    /// Turn the test on and clear the depth buffer
    Enable,
    Disable,
}

/// The texture a shape samples
#[derive(Clone, Debug)]
pub enum TextureBinding {
    Static(TextureId),
    /// Whatever frame the cursor shows when the shape is rasterized
    Animated(Weak<PlaybackCursor>),
}

impl TextureBinding {
    pub fn animated(cursor: &Arc<PlaybackCursor>) -> Self {
        TextureBinding::Animated(Arc::downgrade(cursor))
    }

    /// `None` once an animated binding's cursor is gone
    pub fn resolve(&self) -> Option<TextureId> {
        match self {
            TextureBinding::Static(texture) => Some(*texture),
            TextureBinding::Animated(cursor) => {
                cursor.upgrade().map(|cursor| cursor.current_texture())
            }
        }
    }
}

impl From<TextureId> for TextureBinding {
    fn from(texture: TextureId) -> Self {
        TextureBinding::Static(texture)
    }
}

/// A vertex buffer plus the state needed to draw it
#[derive(Clone, Debug)]
pub struct GeometryShape {
    pub buffer: ShapeBuffer,
    pub texture: Option<TextureBinding>,
    pub blend: TextureBlend,
    pub line_width: f32,
}

impl GeometryShape {
    pub fn new(buffer: ShapeBuffer) -> Self {
        Self {
            buffer,
            texture: None,
            blend: TextureBlend::default(),
            line_width: 1.0,
        }
    }

    pub fn textured(buffer: ShapeBuffer, texture: TextureBinding, blend: TextureBlend) -> Self {
        Self {
            texture: Some(texture),
            blend,
            ..Self::new(buffer)
        }
    }

    pub fn with_line_width(mut self, width: f32) -> Self {
        self.line_width = width;
        self
    }

    fn rasterize(&self, backend: &mut dyn RasterBackend) {
        let buffer = &self.buffer;
        if buffer.is_empty() {
            tracing::trace!(kind = buffer.kind().name(), "skipping empty shape");
            return;
        }

        let texture = match &self.texture {
            Some(binding) => match binding.resolve() {
                Some(texture) => Some(texture),
                None => {
                    tracing::debug!("texture binding no longer resolves, skipping shape");
                    return;
                }
            },
            None => None,
        };
        let tex_coords = buffer.tex_coords().filter(|_| texture.is_some());

        let line_kind = buffer.kind().is_line();
        if line_kind {
            backend.set_line_width(self.line_width);
        }

        backend.enable_array(ClientArray::Vertex);
        backend.vertex_pointer(buffer.vertices());

        if let (Some(texture), Some(tex_coords)) = (texture, tex_coords) {
            backend.enable_array(ClientArray::TexCoord);
            backend.bind_texture(texture, self.blend);
            backend.tex_coord_pointer(tex_coords);
        }

        let has_colors = !buffer.colors().is_empty();
        if has_colors {
            backend.enable_array(ClientArray::Color);
            backend.color_pointer(buffer.colors(), buffer.channels());
        } else {
            backend.set_color(Color::WHITE);
        }

        match buffer.sub_ranges() {
            Some(ranges) => backend.multi_draw_arrays(buffer.kind(), ranges),
            None => backend.draw_arrays(buffer.kind(), 0, buffer.len()),
        }

        if has_colors {
            backend.disable_array(ClientArray::Color);
        }
        if tex_coords.is_some() {
            backend.unbind_texture();
            backend.disable_array(ClientArray::TexCoord);
        }
        backend.disable_array(ClientArray::Vertex);
        if line_kind {
            backend.set_line_width(1.0);
        }
    }
}

/// One entry in the canvas's draw list
#[derive(Clone, Debug)]
pub enum Shape {
    Geometry(GeometryShape),
    DepthTest(DepthTest),
    Text(TextShape),
}

impl Shape {
    pub fn rasterize(&self, backend: &mut dyn RasterBackend, view: &ViewTransform) {
        match self {
            Shape::Geometry(geometry) => geometry.rasterize(backend),
            Shape::DepthTest(DepthTest::Enable) => backend.set_depth_test(true),
            Shape::DepthTest(DepthTest::Disable) => backend.set_depth_test(false),
            Shape::Text(text) => text.rasterize(backend, view),
        }
    }
}

impl From<GeometryShape> for Shape {
    fn from(geometry: GeometryShape) -> Self {
        Shape::Geometry(geometry)
    }
}

impl From<ShapeBuffer> for Shape {
    fn from(buffer: ShapeBuffer) -> Self {
        Shape::Geometry(GeometryShape::new(buffer))
    }
}

impl From<TextShape> for Shape {
    fn from(text: TextShape) -> Self {
        Shape::Text(text)
    }
}
