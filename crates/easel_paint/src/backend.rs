//! Rasterizer backend abstraction
//!
//! Shapes talk to the graphics API only through [`RasterBackend`]. The calls
//! mirror a fixed-function client-array pipeline: enable arrays, point them at
//! data, bind state, draw, restore. [`RecordingBackend`] implements the trait
//! by logging every call, for headless rendering and tests.

use rustc_hash::FxHashMap;

use easel_core::{Channels, Color, TexCoord, TextureId, Vertex2};

use crate::buffer::{PrimitiveKind, SubRange};
use crate::error::BackendError;
use crate::text::FontSpec;
use crate::view::{DeviceSize, ViewBounds};

/// How a bound texture combines with vertex colors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureBlend {
    /// Texel times vertex color
    #[default]
    Modulate,
    /// Texel only
    Replace,
    Decal,
    Blend,
    Add,
}

/// Per-vertex attribute arrays
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientArray {
    Vertex,
    Color,
    TexCoord,
}

/// Everything a backend needs to set up a frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSetup {
    /// Orthographic projection bounds
    pub view: ViewBounds,
    pub device: DeviceSize,
    /// Clear color
    pub background: Color,
}

/// RGBA8 pixels for a new texture, bottom row first
#[derive(Clone, Copy, Debug)]
pub struct TextureUpload<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u8],
}

impl<'a> TextureUpload<'a> {
    pub fn new(width: u32, height: u32, pixels: &'a [u8]) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Byte length the dimensions call for
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Tight bounds of a rendered string in device pixels, relative to the
/// baseline origin. `top` is negative above the baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl TextBounds {
    /// Extent below the baseline (the descent)
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// One string to rasterize at a device-space baseline position
#[derive(Clone, Copy, Debug)]
pub struct TextRun<'a> {
    pub text: &'a str,
    pub font: &'a FontSpec,
    pub pixel_size: f64,
    pub position: (f64, f64),
    pub color: Color,
}

/// The drawing surface shapes rasterize into.
///
/// All calls happen on the thread that owns the graphics context.
pub trait RasterBackend {
    /// Clear to the background and set up the projection for `setup.view`.
    fn begin_frame(&mut self, setup: &FrameSetup);

    fn enable_array(&mut self, array: ClientArray);

    fn disable_array(&mut self, array: ClientArray);

    fn vertex_pointer(&mut self, vertices: &[Vertex2]);

    fn color_pointer(&mut self, colors: &[Color], channels: Channels);

    fn tex_coord_pointer(&mut self, tex_coords: &[TexCoord]);

    /// Constant color used when no color array is enabled
    fn set_color(&mut self, color: Color);

    fn bind_texture(&mut self, texture: TextureId, blend: TextureBlend);

    fn unbind_texture(&mut self);

    fn draw_arrays(&mut self, kind: PrimitiveKind, first: usize, count: usize);

    /// Several same-kind primitives in one call. The default issues one
    /// `draw_arrays` per range.
    fn multi_draw_arrays(&mut self, kind: PrimitiveKind, ranges: &[SubRange]) {
        for range in ranges {
            self.draw_arrays(kind, range.start, range.count);
        }
    }

    fn set_line_width(&mut self, width: f32);

    /// Enabling also clears the depth buffer.
    fn set_depth_test(&mut self, enabled: bool);

    /// Create a texture from RGBA8 pixels.
    fn create_texture(&mut self, upload: &TextureUpload<'_>) -> Result<TextureId, BackendError>;

    /// Tight bounds of `text` rendered with `font` at `pixel_size`.
    fn text_bounds(&mut self, text: &str, font: &FontSpec, pixel_size: f64) -> TextBounds;

    fn draw_text(&mut self, run: &TextRun<'_>);
}

/// A call made against a [`RecordingBackend`]
#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    BeginFrame(FrameSetup),
    EnableArray(ClientArray),
    DisableArray(ClientArray),
    VertexPointer(Vec<Vertex2>),
    ColorPointer {
        colors: Vec<Color>,
        channels: Channels,
    },
    TexCoordPointer(Vec<TexCoord>),
    SetColor(Color),
    BindTexture {
        texture: TextureId,
        blend: TextureBlend,
    },
    UnbindTexture,
    DrawArrays {
        kind: PrimitiveKind,
        first: usize,
        count: usize,
    },
    MultiDrawArrays {
        kind: PrimitiveKind,
        ranges: Vec<SubRange>,
    },
    SetLineWidth(f32),
    SetDepthTest(bool),
    ClearDepth,
    CreateTexture {
        texture: TextureId,
        width: u32,
        height: u32,
    },
    DrawText {
        text: String,
        font: FontSpec,
        pixel_size: f64,
        position: (f64, f64),
        color: Color,
    },
}

impl BackendCall {
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            BackendCall::DrawArrays { .. }
                | BackendCall::MultiDrawArrays { .. }
                | BackendCall::DrawText { .. }
        )
    }
}

/// Texture data held by a [`RecordingBackend`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Glyph advance as a fraction of the pixel size
const GLYPH_ADVANCE: f64 = 0.6;
const GLYPH_ASCENT: f64 = 0.8;
const GLYPH_DESCENT: f64 = 0.2;

/// Headless backend that records calls and tracks pipeline state.
///
/// Text metrics are synthetic: every character advances `0.6 * px`, with an
/// ascent of `0.8 * px` and a descent of `0.2 * px`.
#[derive(Debug)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    textures: FxHashMap<TextureId, RecordedTexture>,
    next_texture: u32,
    enabled: Vec<ClientArray>,
    bound: Option<TextureId>,
    color: Color,
    line_width: f32,
    depth_test: bool,
    fail_textures: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            textures: FxHashMap::default(),
            next_texture: 1,
            enabled: Vec::new(),
            bound: None,
            color: Color::WHITE,
            line_width: 1.0,
            depth_test: false,
            fail_textures: false,
        }
    }

    /// Make every following `create_texture` fail
    pub fn set_fail_textures(&mut self, fail: bool) {
        self.fail_textures = fail;
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    /// Draw calls only, in order
    pub fn draw_calls(&self) -> Vec<&BackendCall> {
        self.calls.iter().filter(|call| call.is_draw()).collect()
    }

    pub fn texture(&self, id: TextureId) -> Option<&RecordedTexture> {
        self.textures.get(&id)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn enabled_arrays(&self) -> &[ClientArray] {
        &self.enabled
    }

    pub fn bound_texture(&self) -> Option<TextureId> {
        self.bound
    }

    pub fn current_color(&self) -> Color {
        self.color
    }

    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    pub fn depth_test(&self) -> bool {
        self.depth_test
    }

    /// No arrays enabled, no texture bound and the default line width
    pub fn is_state_clean(&self) -> bool {
        self.enabled.is_empty() && self.bound.is_none() && self.line_width == 1.0
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterBackend for RecordingBackend {
    fn begin_frame(&mut self, setup: &FrameSetup) {
        self.calls.push(BackendCall::BeginFrame(*setup));
    }

    fn enable_array(&mut self, array: ClientArray) {
        if !self.enabled.contains(&array) {
            self.enabled.push(array);
        }
        self.calls.push(BackendCall::EnableArray(array));
    }

    fn disable_array(&mut self, array: ClientArray) {
        self.enabled.retain(|enabled| *enabled != array);
        self.calls.push(BackendCall::DisableArray(array));
    }

    fn vertex_pointer(&mut self, vertices: &[Vertex2]) {
        self.calls.push(BackendCall::VertexPointer(vertices.to_vec()));
    }

    fn color_pointer(&mut self, colors: &[Color], channels: Channels) {
        self.calls.push(BackendCall::ColorPointer {
            colors: colors.to_vec(),
            channels,
        });
    }

    fn tex_coord_pointer(&mut self, tex_coords: &[TexCoord]) {
        self.calls.push(BackendCall::TexCoordPointer(tex_coords.to_vec()));
    }

    fn set_color(&mut self, color: Color) {
        self.color = color;
        self.calls.push(BackendCall::SetColor(color));
    }

    fn bind_texture(&mut self, texture: TextureId, blend: TextureBlend) {
        self.bound = Some(texture);
        self.calls.push(BackendCall::BindTexture { texture, blend });
    }

    fn unbind_texture(&mut self) {
        self.bound = None;
        self.calls.push(BackendCall::UnbindTexture);
    }

    fn draw_arrays(&mut self, kind: PrimitiveKind, first: usize, count: usize) {
        self.calls.push(BackendCall::DrawArrays { kind, first, count });
    }

    fn multi_draw_arrays(&mut self, kind: PrimitiveKind, ranges: &[SubRange]) {
        self.calls.push(BackendCall::MultiDrawArrays {
            kind,
            ranges: ranges.to_vec(),
        });
    }

    fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
        self.calls.push(BackendCall::SetLineWidth(width));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
        self.calls.push(BackendCall::SetDepthTest(enabled));
        if enabled {
            self.calls.push(BackendCall::ClearDepth);
        }
    }

    fn create_texture(&mut self, upload: &TextureUpload<'_>) -> Result<TextureId, BackendError> {
        if self.fail_textures {
            return Err(BackendError::TextureCreation(
                "texture creation disabled".to_string(),
            ));
        }
        if upload.pixels.len() != upload.expected_len() {
            return Err(BackendError::TextureCreation(format!(
                "{}x{} texture needs {} bytes, got {}",
                upload.width,
                upload.height,
                upload.expected_len(),
                upload.pixels.len()
            )));
        }

        let texture = TextureId(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(
            texture,
            RecordedTexture {
                width: upload.width,
                height: upload.height,
                pixels: upload.pixels.to_vec(),
            },
        );
        self.calls.push(BackendCall::CreateTexture {
            texture,
            width: upload.width,
            height: upload.height,
        });
        Ok(texture)
    }

    fn text_bounds(&mut self, text: &str, _font: &FontSpec, pixel_size: f64) -> TextBounds {
        let chars = text.chars().count();
        if chars == 0 {
            return TextBounds::default();
        }
        TextBounds {
            left: 0.0,
            top: -GLYPH_ASCENT * pixel_size,
            width: GLYPH_ADVANCE * pixel_size * chars as f64,
            height: (GLYPH_ASCENT + GLYPH_DESCENT) * pixel_size,
        }
    }

    fn draw_text(&mut self, run: &TextRun<'_>) {
        self.calls.push(BackendCall::DrawText {
            text: run.text.to_string(),
            font: run.font.clone(),
            pixel_size: run.pixel_size,
            position: run.position,
            color: run.color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_tracking() {
        let mut backend = RecordingBackend::new();
        backend.enable_array(ClientArray::Vertex);
        backend.enable_array(ClientArray::Vertex);
        backend.bind_texture(TextureId(3), TextureBlend::Modulate);
        backend.set_line_width(4.0);
        assert_eq!(backend.enabled_arrays(), &[ClientArray::Vertex]);
        assert!(!backend.is_state_clean());

        backend.disable_array(ClientArray::Vertex);
        backend.unbind_texture();
        backend.set_line_width(1.0);
        assert!(backend.is_state_clean());
    }

    #[test]
    fn test_depth_enable_clears() {
        let mut backend = RecordingBackend::new();
        backend.set_depth_test(true);
        backend.set_depth_test(false);
        assert_eq!(
            backend.calls(),
            &[
                BackendCall::SetDepthTest(true),
                BackendCall::ClearDepth,
                BackendCall::SetDepthTest(false)
            ]
        );
    }

    #[test]
    fn test_texture_creation() {
        let mut backend = RecordingBackend::new();
        let pixels = vec![255u8; 2 * 2 * 4];
        let id = backend.create_texture(&TextureUpload::new(2, 2, &pixels)).unwrap();
        assert_eq!(backend.texture(id).map(|t| t.width), Some(2));

        let short = backend.create_texture(&TextureUpload::new(3, 3, &pixels));
        assert!(matches!(short, Err(BackendError::TextureCreation(_))));

        backend.set_fail_textures(true);
        assert!(backend.create_texture(&TextureUpload::new(2, 2, &pixels)).is_err());
        assert_eq!(backend.texture_count(), 1);
    }

    #[test]
    fn test_synthetic_text_bounds() {
        let mut backend = RecordingBackend::new();
        let bounds = backend.text_bounds("abcd", &FontSpec::default(), 10.0);
        assert!((bounds.width - 24.0).abs() < 1e-9);
        assert!((bounds.top + 8.0).abs() < 1e-9);
        assert!((bounds.bottom() - 2.0).abs() < 1e-9);
        assert_eq!(backend.text_bounds("", &FontSpec::default(), 10.0), TextBounds::default());
    }
}
