//! The immediate-mode canvas
//!
//! Draw calls expand geometry right away and append shapes to an ordered
//! list; list order is z-order. [`Canvas::paint`] rasterizes the list and
//! keeps it, so a static scene can be painted repeatedly until the client
//! calls [`Canvas::clear`].

use std::sync::Arc;
use std::time::Instant;

use easel_animation::{AnimationLayers, CursorArena, TickScheduler};
use easel_core::{Color, TexCoord, Vertex2};
use easel_image::{DecodedImage, ImageSource};

use crate::backend::{FrameSetup, RasterBackend, TextureBlend};
use crate::buffer::{PrimitiveKind, ShapeBuffer, SubRange};
use crate::color::{normalize_colors, ColorSpec};
use crate::config::CanvasConfig;
use crate::error::Result;
use crate::geometry::{
    expand_arc_fan, expand_line_stroke, expand_line_strip_stroke, expand_quad_outlines,
    expand_quads_from_corners, expand_ring_strip, expand_thick_points, rect_corners, AngleRanges,
    CornerType, QuadPaint, Radii, StrokeGeometry, DEFAULT_ARC_SEGMENTS,
};
use crate::shape::{DepthTest, GeometryShape, Shape};
use crate::text::{FontSpec, TextShape, TextSize};
use crate::texture::{TextureHandler, TextureRef, TextureRegistry};
use crate::view::{DeviceSize, ResizePolicy, ViewBounds, ViewTransform};

/// Texture coordinates for a whole image drawn as one quad
const IMAGE_TEX_COORDS: [TexCoord; 4] = [
    TexCoord::new(0.0, 0.0),
    TexCoord::new(0.0, 1.0),
    TexCoord::new(1.0, 1.0),
    TexCoord::new(1.0, 0.0),
];

/// Shapes waiting to be painted, in draw order
#[derive(Debug, Default)]
pub struct ShapeList {
    shapes: Vec<Shape>,
}

impl ShapeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Shape> {
        self.shapes.iter()
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }
}

impl<'a> IntoIterator for &'a ShapeList {
    type Item = &'a Shape;
    type IntoIter = std::slice::Iter<'a, Shape>;

    fn into_iter(self) -> Self::IntoIter {
        self.shapes.iter()
    }
}

/// View state, textures and the pending shape list
#[derive(Debug)]
pub struct Canvas {
    view: ViewBounds,
    device: DeviceSize,
    resize_policy: ResizePolicy,
    background: Color,
    arc_segments: u32,
    textures: TextureRegistry,
    shapes: ShapeList,
    layers: AnimationLayers,
}

impl Canvas {
    /// Canvas with default settings; animated textures tick on OS threads
    pub fn new() -> Self {
        Self::with_arena(CursorArena::with_threads())
    }

    pub fn with_scheduler(scheduler: Arc<dyn TickScheduler>) -> Self {
        Self::with_arena(CursorArena::new(scheduler))
    }

    fn with_arena(cursors: CursorArena) -> Self {
        Self {
            view: ViewBounds::default(),
            device: DeviceSize::default(),
            resize_policy: ResizePolicy::default(),
            background: Color::BLACK,
            arc_segments: DEFAULT_ARC_SEGMENTS,
            textures: TextureRegistry::new(cursors),
            shapes: ShapeList::new(),
            layers: AnimationLayers::new(),
        }
    }

    /// Build from a validated config and queue its textures
    pub fn from_config(config: &CanvasConfig) -> Result<Self> {
        Self::configure(config, CursorArena::with_threads())
    }

    pub fn from_config_with_scheduler(
        config: &CanvasConfig,
        scheduler: Arc<dyn TickScheduler>,
    ) -> Result<Self> {
        Self::configure(config, CursorArena::new(scheduler))
    }

    fn configure(config: &CanvasConfig, cursors: CursorArena) -> Result<Self> {
        config.validate()?;
        let mut canvas = Self::with_arena(cursors);
        canvas.view = config.view;
        canvas.device = DeviceSize::new(config.device.width, config.device.height);
        canvas.resize_policy = config.resize_policy;
        canvas.background = config.background_color()?;
        canvas.arc_segments = config.arc_segments;
        for (name, path) in &config.textures {
            canvas.load_texture(name.clone(), ImageSource::file(path));
        }
        Ok(canvas)
    }

    // View and device

    pub fn view_bounds(&self) -> ViewBounds {
        self.view
    }

    pub fn set_view_bounds(&mut self, bounds: ViewBounds) {
        self.view = bounds;
    }

    /// Move the view so `(x, y)` is its middle, keeping its size
    pub fn center_view_at(&mut self, x: f64, y: f64) {
        self.view = self.view.centered_at(x, y);
    }

    pub fn view_width(&self) -> f64 {
        self.view.width()
    }

    pub fn view_height(&self) -> f64 {
        self.view.height()
    }

    pub fn view_diagonal(&self) -> f64 {
        self.view.diagonal()
    }

    pub fn device_size(&self) -> DeviceSize {
        self.device
    }

    /// Change the device size without adapting the view bounds
    pub fn set_device_size(&mut self, width: u32, height: u32) {
        self.device = DeviceSize::new(width, height);
    }

    /// Change the device size and adapt the view bounds by the resize policy
    pub fn resize(&mut self, width: u32, height: u32) {
        let current = DeviceSize::new(width, height);
        self.view = self.resize_policy.apply(self.view, self.device, current);
        self.device = current;
        tracing::debug!(
            width,
            height,
            policy = ?self.resize_policy,
            view = ?self.view,
            "canvas resized"
        );
    }

    pub fn resize_policy(&self) -> ResizePolicy {
        self.resize_policy
    }

    pub fn set_resize_policy(&mut self, policy: ResizePolicy) {
        self.resize_policy = policy;
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    pub fn arc_segments(&self) -> u32 {
        self.arc_segments
    }

    /// Segment count for arcs and rings drawn without an explicit one.
    /// Values below 2 are raised to 2.
    pub fn set_arc_segments(&mut self, segments: u32) {
        self.arc_segments = segments.max(2);
    }

    pub fn view_transform(&self) -> ViewTransform {
        ViewTransform::new(self.view, self.device)
    }

    pub fn squash_factor(&self) -> f64 {
        self.view_transform().squash_factor()
    }

    pub fn view_to_device(&self, x: f64, y: f64) -> (f64, f64) {
        self.view_transform().view_to_device(x, y)
    }

    pub fn device_to_view(&self, x: f64, y: f64) -> (f64, f64) {
        self.view_transform().device_to_view(x, y)
    }

    // Frame lifecycle

    pub fn shapes(&self) -> &ShapeList {
        &self.shapes
    }

    /// Drop every pending shape
    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    /// Load queued textures, then rasterize the pending shapes in order
    pub fn paint(&mut self, backend: &mut dyn RasterBackend) {
        self.load_queued_textures(backend);
        self.textures.prune_cursors();
        backend.begin_frame(&FrameSetup {
            view: self.view,
            device: self.device,
            background: self.background,
        });
        let view = self.view_transform();
        for shape in &self.shapes {
            shape.rasterize(backend, &view);
        }
    }

    pub fn push_shape(&mut self, shape: impl Into<Shape>) {
        self.shapes.push(shape.into());
    }

    fn push_buffer(&mut self, shape: GeometryShape) {
        if shape.buffer.is_empty() {
            tracing::trace!(kind = shape.buffer.kind().name(), "skipping empty geometry");
            return;
        }
        self.shapes.push(Shape::Geometry(shape));
    }

    fn push_stroke(&mut self, stroke: StrokeGeometry) {
        if stroke.is_empty() {
            tracing::trace!("skipping empty stroke");
            return;
        }
        match stroke.caps {
            Some(caps) => {
                self.shapes.push(Shape::DepthTest(DepthTest::Enable));
                self.push_buffer(GeometryShape::new(stroke.body));
                self.push_buffer(GeometryShape::new(caps));
                self.shapes.push(Shape::DepthTest(DepthTest::Disable));
            }
            None => self.push_buffer(GeometryShape::new(stroke.body)),
        }
    }

    fn textured_buffer(
        &mut self,
        buffer: ShapeBuffer,
        texture: TextureRef<'_>,
        blend: TextureBlend,
    ) -> bool {
        match self.textures.resolve(texture) {
            Some(handler) => {
                self.push_buffer(GeometryShape::textured(buffer, handler.binding(), blend));
                true
            }
            None => false,
        }
    }

    // Drawing

    /// Points, or squares of side `width` centred on each point
    pub fn draw_points(
        &mut self,
        points: &[Vertex2],
        colors: impl Into<ColorSpec>,
        width: Option<f32>,
    ) -> Result<()> {
        let buffer = expand_thick_points(points, width, &colors.into())?;
        self.push_buffer(GeometryShape::new(buffer));
        Ok(())
    }

    /// Triangles of three vertices; colors are one, per vertex or per triangle
    pub fn fill_triangles(
        &mut self,
        vertices: &[Vertex2],
        colors: impl Into<ColorSpec>,
    ) -> Result<()> {
        let colors = colors.into();
        let kind = PrimitiveKind::Triangles;
        let per_vertex = normalize_colors(&colors, vertices.len(), kind.element_length(), None)?;
        let buffer = ShapeBuffer::new(kind, vertices.to_vec(), per_vertex, colors.channels())?;
        self.push_buffer(GeometryShape::new(buffer));
        Ok(())
    }

    /// Textured triangles. Returns `false` (drawing nothing) when the texture
    /// does not resolve.
    pub fn fill_textured_triangles<'a>(
        &mut self,
        vertices: &[Vertex2],
        tex_coords: &[TexCoord],
        texture: impl Into<TextureRef<'a>>,
        tint: Option<ColorSpec>,
        blend: TextureBlend,
    ) -> Result<bool> {
        let kind = PrimitiveKind::Triangles;
        let (colors, channels) = match tint.filter(|tint| !tint.is_empty()) {
            Some(tint) => (
                normalize_colors(&tint, vertices.len(), kind.element_length(), None)?,
                tint.channels(),
            ),
            None => (Vec::new(), Default::default()),
        };
        let buffer = ShapeBuffer::new(kind, vertices.to_vec(), colors, channels)?
            .with_tex_coords(tex_coords.to_vec())?;
        Ok(self.textured_buffer(buffer, texture.into(), blend))
    }

    fn batched(
        &mut self,
        kind: PrimitiveKind,
        vertices: &[Vertex2],
        colors: ColorSpec,
        starts: &[usize],
        line_width: f32,
    ) -> Result<()> {
        let ranges = if starts.len() > 1 {
            SubRange::from_starts(starts, vertices.len())?
        } else {
            Vec::new()
        };
        let sub_ranges = (!ranges.is_empty()).then_some(ranges.as_slice());
        let per_vertex =
            normalize_colors(&colors, vertices.len(), kind.element_length(), sub_ranges)?;
        let buffer = ShapeBuffer::new(kind, vertices.to_vec(), per_vertex, colors.channels())?
            .with_sub_ranges(ranges)?;
        self.push_buffer(GeometryShape::new(buffer).with_line_width(line_width));
        Ok(())
    }

    /// Triangle fans packed in one buffer, each starting at an index of
    /// `starts`. Colors are one, per vertex or per fan.
    pub fn fill_triangle_fans(
        &mut self,
        vertices: &[Vertex2],
        colors: impl Into<ColorSpec>,
        starts: &[usize],
    ) -> Result<()> {
        self.batched(PrimitiveKind::TriangleFan, vertices, colors.into(), starts, 1.0)
    }

    pub fn fill_triangle_strips(
        &mut self,
        vertices: &[Vertex2],
        colors: impl Into<ColorSpec>,
        starts: &[usize],
    ) -> Result<()> {
        self.batched(PrimitiveKind::TriangleStrip, vertices, colors.into(), starts, 1.0)
    }

    /// Closed polygon outlines, each starting at an index of `starts`
    pub fn draw_polygons(
        &mut self,
        vertices: &[Vertex2],
        colors: impl Into<ColorSpec>,
        starts: &[usize],
        line_width: Option<f32>,
    ) -> Result<()> {
        self.batched(
            PrimitiveKind::LineLoop,
            vertices,
            colors.into(),
            starts,
            line_width.unwrap_or(1.0),
        )
    }

    /// Quads of four corners; colors are one, per corner or per quad
    pub fn fill_quads(&mut self, corners: &[Vertex2], colors: impl Into<ColorSpec>) -> Result<()> {
        let buffer = expand_quads_from_corners(corners, &QuadPaint::Colors(colors.into()))?;
        self.push_buffer(GeometryShape::new(buffer));
        Ok(())
    }

    /// Textured quads. Returns `false` when the texture does not resolve.
    pub fn fill_textured_quads<'a>(
        &mut self,
        corners: &[Vertex2],
        tex_coords: &[TexCoord],
        texture: impl Into<TextureRef<'a>>,
        tint: Option<ColorSpec>,
        blend: TextureBlend,
    ) -> Result<bool> {
        let paint = QuadPaint::Textured {
            tex_coords: tex_coords.to_vec(),
            tint,
        };
        let buffer = expand_quads_from_corners(corners, &paint)?;
        Ok(self.textured_buffer(buffer, texture.into(), blend))
    }

    /// Quad outlines, thickened when `width` is given
    pub fn draw_quads(
        &mut self,
        corners: &[Vertex2],
        colors: impl Into<ColorSpec>,
        width: Option<f32>,
    ) -> Result<()> {
        let stroke = expand_quad_outlines(corners, width, &colors.into())?;
        self.push_stroke(stroke);
        Ok(())
    }

    /// Draw a whole texture as one quad.
    ///
    /// A missing width or height follows the image's aspect ratio, corrected
    /// for the view's squash; with neither the quad is 1x1. Returns the drawn
    /// size, or `None` without drawing when the texture does not resolve.
    pub fn draw_image<'a>(
        &mut self,
        location: Vertex2,
        texture: impl Into<TextureRef<'a>>,
        width: Option<f32>,
        height: Option<f32>,
        center_anchored: bool,
    ) -> Result<Option<(f32, f32)>> {
        let Some(handler) = self.textures.resolve(texture.into()) else {
            return Ok(None);
        };
        let (image_w, image_h) = handler.dimensions();
        let (image_w, image_h) = (image_w.max(1) as f32, image_h.max(1) as f32);
        let squash = self.squash_factor() as f32;
        let (width, height) = match (width, height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, w * image_h / image_w / squash),
            (None, Some(h)) => (h * image_w / image_h * squash, h),
            (None, None) => (1.0, 1.0),
        };

        let corners = rect_corners(&[location], &[(width, height)], center_anchored)?;
        let paint = QuadPaint::Textured {
            tex_coords: IMAGE_TEX_COORDS.to_vec(),
            tint: Some(Color::WHITE.into()),
        };
        let buffer = expand_quads_from_corners(&corners, &paint)?;
        self.push_buffer(GeometryShape::textured(
            buffer,
            handler.binding(),
            TextureBlend::Modulate,
        ));
        Ok(Some((width, height)))
    }

    /// Filled rectangles; `dimensions` is one `(w, h)` per location or one shared
    pub fn fill_rects(
        &mut self,
        locations: &[Vertex2],
        dimensions: &[(f32, f32)],
        colors: impl Into<ColorSpec>,
        center_anchored: bool,
    ) -> Result<()> {
        let corners = rect_corners(locations, dimensions, center_anchored)?;
        self.fill_quads(&corners, colors)
    }

    pub fn draw_rects(
        &mut self,
        locations: &[Vertex2],
        dimensions: &[(f32, f32)],
        colors: impl Into<ColorSpec>,
        width: Option<f32>,
        center_anchored: bool,
    ) -> Result<()> {
        let corners = rect_corners(locations, dimensions, center_anchored)?;
        self.draw_quads(&corners, colors, width)
    }

    /// Independent segments from consecutive vertex pairs
    pub fn draw_lines(
        &mut self,
        vertex_pairs: &[Vertex2],
        colors: impl Into<ColorSpec>,
        width: Option<f32>,
        corner_type: CornerType,
    ) -> Result<()> {
        let stroke = expand_line_stroke(vertex_pairs, width, &colors.into(), corner_type)?;
        self.push_stroke(stroke);
        Ok(())
    }

    /// A connected polyline
    pub fn draw_line_strip(
        &mut self,
        polyline: &[Vertex2],
        colors: impl Into<ColorSpec>,
        width: Option<f32>,
        corner_type: CornerType,
        double_back: bool,
    ) -> Result<()> {
        let stroke =
            expand_line_strip_stroke(polyline, width, &colors.into(), corner_type, double_back)?;
        self.push_stroke(stroke);
        Ok(())
    }

    /// Filled arcs or ellipse sectors. `segments` defaults to the canvas's
    /// arc segment count.
    pub fn fill_arcs(
        &mut self,
        centers: &[Vertex2],
        radii: impl Into<Radii>,
        colors: impl Into<ColorSpec>,
        angles: AngleRanges,
        segments: Option<u32>,
    ) -> Result<()> {
        let buffer = expand_arc_fan(
            centers,
            &radii.into(),
            &angles,
            &colors.into(),
            segments.unwrap_or(self.arc_segments),
        )?;
        self.push_buffer(GeometryShape::new(buffer));
        Ok(())
    }

    pub fn fill_rings(
        &mut self,
        centers: &[Vertex2],
        inner_radii: impl Into<Radii>,
        outer_radii: impl Into<Radii>,
        colors: impl Into<ColorSpec>,
        angles: AngleRanges,
        segments: Option<u32>,
    ) -> Result<()> {
        let buffer = expand_ring_strip(
            centers,
            &inner_radii.into(),
            &outer_radii.into(),
            &angles,
            &colors.into(),
            segments.unwrap_or(self.arc_segments),
        )?;
        self.push_buffer(GeometryShape::new(buffer));
        Ok(())
    }

    /// Text with its bottom-left at `location`. Use [`draw_text_shape`](Self::draw_text_shape)
    /// for other anchors or to leave the descent out of the height.
    pub fn draw_text(
        &mut self,
        text: impl Into<String>,
        location: (f64, f64),
        size: impl Into<TextSize>,
        color: Color,
        font: FontSpec,
    ) {
        self.draw_text_shape(TextShape::new(text, location, size, color, font));
    }

    pub fn draw_text_shape(&mut self, text: TextShape) {
        if text.text.is_empty() {
            tracing::trace!("skipping empty text");
            return;
        }
        self.shapes.push(Shape::Text(text));
    }

    // Textures

    /// Queue an image; it loads on the next paint
    pub fn load_texture(&mut self, name: impl Into<String>, source: ImageSource) {
        self.textures.queue(name, source);
    }

    pub fn load_queued_textures(&mut self, backend: &mut dyn RasterBackend) -> usize {
        if self.textures.queued_len() == 0 {
            return 0;
        }
        self.textures.load_queued(backend)
    }

    /// Upload an image decoded elsewhere
    pub fn insert_texture(
        &mut self,
        name: &str,
        decoded: DecodedImage,
        backend: &mut dyn RasterBackend,
    ) -> Result<()> {
        self.textures.insert_decoded(name, decoded, backend)
    }

    /// A handler for one drawing instance of `name`; animated images get
    /// their own stopped cursor
    pub fn texture_handler(&mut self, name: &str) -> Option<TextureHandler> {
        self.textures.handler(name)
    }

    pub fn shared_texture_handler(&self, name: &str) -> Option<TextureHandler> {
        self.textures.shared_handler(name)
    }

    pub fn start_playback(&mut self, handler: &TextureHandler) -> bool {
        self.textures.start(handler)
    }

    pub fn stop_playback(&mut self, handler: &TextureHandler) -> bool {
        self.textures.stop(handler)
    }

    pub fn reset_playback(&self, handler: &TextureHandler) -> bool {
        self.textures.reset(handler)
    }

    pub fn release_handler(&mut self, handler: &TextureHandler) -> bool {
        self.textures.release(handler)
    }

    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    // Animation layers

    /// Register a `(dt, elapsed) -> keep` callback run by
    /// [`advance_animations`](Self::advance_animations)
    pub fn add_animation_layer<F>(&mut self, update: F)
    where
        F: FnMut(f32, f32) -> bool + 'static,
    {
        self.layers.add(update);
    }

    pub fn advance_animations(&mut self, now: Instant) {
        self.layers.advance(now);
    }

    pub fn animation_layers(&self) -> &AnimationLayers {
        &self.layers
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}
