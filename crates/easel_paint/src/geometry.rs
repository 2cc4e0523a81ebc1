//! Geometry expansion
//!
//! Pure functions that turn primitive descriptions (points with a size, quads,
//! thick lines, arcs and rings) into flat vertex buffers. Nothing here talks
//! to a backend; every function either returns a well formed [`ShapeBuffer`]
//! or a [`ShapeArityError`] wrapped in [`PaintError`](crate::PaintError).
//!
//! Quads are always split along the c0-c2 diagonal into `(c0, c1, c2)` and
//! `(c0, c3, c2)`, and colors or texture coordinates follow their original
//! vertex through the split.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use easel_core::{Color, TexCoord, Vertex2};

use crate::buffer::{PrimitiveKind, ShapeBuffer, SubRange};
use crate::color::{normalize_colors, repeat_each, ColorSpec};
use crate::error::{Result, ShapeArityError};

/// Segment count used for fills when the caller does not pick one
pub const DEFAULT_ARC_SEGMENTS: u32 = 100;

/// Two unit directions further apart than this turn by more than 90 degrees
const SHARP_TURN: f32 = std::f32::consts::SQRT_2;

/// How thick line strokes treat the points where segments meet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerType {
    /// Independent quads per segment
    #[default]
    None,
    /// Quads plus a filled circle at every vertex
    Rounded,
    /// One continuous triangle strip with averaged joins
    FlatBrush,
}

/// Arc and ring radii
#[derive(Clone, Debug, PartialEq)]
pub enum Radii {
    /// One radius for every center
    Shared(f32),
    /// One radius per center (a single entry is broadcast)
    PerCenter(Vec<f32>),
    /// One `(rx, ry)` pair per center
    Elliptical(Vec<(f32, f32)>),
}

impl Radii {
    fn resolve(&self, centers: usize) -> std::result::Result<Vec<(f32, f32)>, ShapeArityError> {
        match self {
            Radii::Shared(r) => Ok(vec![(*r, *r); centers]),
            Radii::PerCenter(radii) if radii.len() == 1 => Ok(vec![(radii[0], radii[0]); centers]),
            Radii::PerCenter(radii) if radii.len() == centers => {
                Ok(radii.iter().map(|r| (*r, *r)).collect())
            }
            Radii::Elliptical(radii) if radii.len() == 1 => Ok(vec![radii[0]; centers]),
            Radii::Elliptical(radii) if radii.len() == centers => Ok(radii.clone()),
            Radii::PerCenter(radii) => Err(ShapeArityError::RadiusCount {
                radii: radii.len(),
                centers,
            }),
            Radii::Elliptical(radii) => Err(ShapeArityError::RadiusCount {
                radii: radii.len(),
                centers,
            }),
        }
    }
}

impl From<f32> for Radii {
    fn from(radius: f32) -> Self {
        Radii::Shared(radius)
    }
}

impl From<Vec<f32>> for Radii {
    fn from(radii: Vec<f32>) -> Self {
        Radii::PerCenter(radii)
    }
}

impl From<Vec<(f32, f32)>> for Radii {
    fn from(radii: Vec<(f32, f32)>) -> Self {
        Radii::Elliptical(radii)
    }
}

/// Angle ranges in radians, counter-clockwise from +x
#[derive(Clone, Debug, PartialEq)]
pub enum AngleRanges {
    Shared(f32, f32),
    PerCenter(Vec<(f32, f32)>),
}

impl AngleRanges {
    pub const FULL_CIRCLE: AngleRanges = AngleRanges::Shared(0.0, TAU as f32);

    fn resolve(&self, centers: usize) -> std::result::Result<Vec<(f32, f32)>, ShapeArityError> {
        match self {
            AngleRanges::Shared(start, end) => Ok(vec![(*start, *end); centers]),
            AngleRanges::PerCenter(ranges) if ranges.len() == centers => Ok(ranges.clone()),
            AngleRanges::PerCenter(ranges) => Err(ShapeArityError::AngleCount {
                ranges: ranges.len(),
                centers,
            }),
        }
    }
}

impl Default for AngleRanges {
    fn default() -> Self {
        AngleRanges::FULL_CIRCLE
    }
}

impl From<(f32, f32)> for AngleRanges {
    fn from((start, end): (f32, f32)) -> Self {
        AngleRanges::Shared(start, end)
    }
}

/// How quads are painted
#[derive(Clone, Debug, PartialEq)]
pub enum QuadPaint {
    /// One color, one per corner, or one per quad
    Colors(ColorSpec),
    /// One texture coordinate per corner, optionally tinted
    Textured {
        tex_coords: Vec<TexCoord>,
        tint: Option<ColorSpec>,
    },
}

impl From<ColorSpec> for QuadPaint {
    fn from(colors: ColorSpec) -> Self {
        QuadPaint::Colors(colors)
    }
}

/// A stroke body plus the optional round caps drawn over its joints
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeGeometry {
    pub body: ShapeBuffer,
    pub caps: Option<ShapeBuffer>,
}

impl StrokeGeometry {
    fn plain(body: ShapeBuffer) -> Self {
        Self { body, caps: None }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty() && self.caps.as_ref().map_or(true, ShapeBuffer::is_empty)
    }
}

/// Reorder quad corners into two triangles per quad
fn split_quads<T: Copy>(corners: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(corners.len() / 4 * 6);
    for quad in corners.chunks_exact(4) {
        out.extend_from_slice(&[quad[0], quad[1], quad[2], quad[0], quad[3], quad[2]]);
    }
    out
}

/// Reorder quad corners into the endpoints of its four edges
fn outline_segments<T: Copy>(corners: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(corners.len() * 2);
    for quad in corners.chunks_exact(4) {
        out.extend_from_slice(&[
            quad[0], quad[1], quad[1], quad[2], quad[2], quad[3], quad[3], quad[0],
        ]);
    }
    out
}

fn check_multiple(
    what: &'static str,
    count: usize,
    multiple: usize,
) -> std::result::Result<(), ShapeArityError> {
    if count % multiple == 0 {
        Ok(())
    } else {
        Err(ShapeArityError::VertexCount {
            what,
            multiple,
            count,
        })
    }
}

/// Colors for quads expanded by [`split_quads`]
fn quad_colors(
    spec: &ColorSpec,
    corner_count: usize,
) -> std::result::Result<Vec<Color>, ShapeArityError> {
    let quads = corner_count / 4;
    let vertex_count = quads * 6;
    match spec.len() {
        0 | 1 => normalize_colors(spec, vertex_count, 1, None),
        n if n == corner_count => Ok(split_quads(spec.colors())),
        n if n == quads => Ok(repeat_each(spec.colors(), 6)),
        n => Err(ShapeArityError::ColorCount {
            colors: n,
            vertices: corner_count,
        }),
    }
}

/// Point on an ellipse at step `i` of `steps` through `[start, end]`
fn perimeter_point(
    center: Vertex2,
    (rx, ry): (f32, f32),
    (start, end): (f32, f32),
    i: u32,
    steps: u32,
) -> Vertex2 {
    let t = f64::from(i) / f64::from(steps);
    let angle = f64::from(start) + (f64::from(end) - f64::from(start)) * t;
    Vertex2::new(
        center.x + rx * angle.cos() as f32,
        center.y + ry * angle.sin() as f32,
    )
}

/// Squares of side `width` centred on each point, or plain points without a width.
///
/// Colors: one, or one per point.
pub fn expand_thick_points(
    points: &[Vertex2],
    width: Option<f32>,
    colors: &ColorSpec,
) -> Result<ShapeBuffer> {
    let Some(width) = width else {
        let colors_out = normalize_colors(colors, points.len(), 1, None)?;
        return Ok(ShapeBuffer::new(
            PrimitiveKind::Points,
            points.to_vec(),
            colors_out,
            colors.channels(),
        )?);
    };

    let h = width / 2.0;
    let offsets = [
        Vertex2::new(-h, -h),
        Vertex2::new(-h, h),
        Vertex2::new(h, -h),
        Vertex2::new(h, h),
        Vertex2::new(-h, h),
        Vertex2::new(h, -h),
    ];
    let vertices: Vec<Vertex2> = points
        .iter()
        .flat_map(|p| offsets.iter().map(move |o| *p + *o))
        .collect();

    let colors_out = match colors.len() {
        0 | 1 => normalize_colors(colors, vertices.len(), 1, None)?,
        n if n == points.len() => repeat_each(colors.colors(), 6),
        n => {
            return Err(ShapeArityError::ColorCount {
                colors: n,
                vertices: points.len(),
            }
            .into())
        }
    };
    Ok(ShapeBuffer::new(
        PrimitiveKind::Triangles,
        vertices,
        colors_out,
        colors.channels(),
    )?)
}

/// Two triangles per quad of four corners
pub fn expand_quads_from_corners(corners: &[Vertex2], paint: &QuadPaint) -> Result<ShapeBuffer> {
    check_multiple("quads", corners.len(), 4)?;
    let vertices = split_quads(corners);

    match paint {
        QuadPaint::Colors(spec) => {
            let colors = quad_colors(spec, corners.len())?;
            Ok(ShapeBuffer::new(
                PrimitiveKind::Triangles,
                vertices,
                colors,
                spec.channels(),
            )?)
        }
        QuadPaint::Textured { tex_coords, tint } => {
            if tex_coords.len() != corners.len() {
                return Err(ShapeArityError::TexCoordCount {
                    tex_coords: tex_coords.len(),
                    vertices: corners.len(),
                }
                .into());
            }
            let tint = tint.as_ref().filter(|spec| !spec.is_empty());
            let (colors, channels) = match tint {
                Some(spec) => (quad_colors(spec, corners.len())?, spec.channels()),
                None => (Vec::new(), easel_core::Channels::Rgba),
            };
            Ok(ShapeBuffer::new(PrimitiveKind::Triangles, vertices, colors, channels)?
                .with_tex_coords(split_quads(tex_coords))?)
        }
    }
}

/// The four edges of each quad, optionally thickened.
///
/// Colors: one, one per corner (edge endpoints keep their corner's color), or
/// one per quad.
pub fn expand_quad_outlines(
    corners: &[Vertex2],
    width: Option<f32>,
    colors: &ColorSpec,
) -> Result<StrokeGeometry> {
    check_multiple("quad outlines", corners.len(), 4)?;
    let quads = corners.len() / 4;
    let lines = outline_segments(corners);

    let line_colors = match colors.len() {
        0 | 1 => colors.clone(),
        n if n == corners.len() => colors.with_colors(outline_segments(colors.colors())),
        n if n == quads => colors.with_colors(repeat_each(colors.colors(), 8)),
        n => {
            return Err(ShapeArityError::ColorCount {
                colors: n,
                vertices: corners.len(),
            }
            .into())
        }
    };
    expand_line_stroke(&lines, width, &line_colors, CornerType::None)
}

enum VertexColors {
    Uniform(Color),
    PerVertex(Vec<Color>),
}

/// Independent segments from consecutive vertex pairs.
///
/// Colors: one, one per segment, or one per vertex. Zero-length segments are
/// dropped along with their colors.
pub fn expand_line_stroke(
    vertex_pairs: &[Vertex2],
    width: Option<f32>,
    colors: &ColorSpec,
    corner_type: CornerType,
) -> Result<StrokeGeometry> {
    check_multiple("line segments", vertex_pairs.len(), 2)?;

    let Some(width) = width else {
        let colors_out = normalize_colors(colors, vertex_pairs.len(), 2, None)?;
        let body = ShapeBuffer::new(
            PrimitiveKind::Lines,
            vertex_pairs.to_vec(),
            colors_out,
            colors.channels(),
        )?;
        return Ok(StrokeGeometry::plain(body));
    };

    let vertex_colors = match colors.single() {
        Some(color) => VertexColors::Uniform(color),
        None if colors.is_empty() => VertexColors::Uniform(Color::BLACK),
        None => VertexColors::PerVertex(normalize_colors(colors, vertex_pairs.len(), 2, None)?),
    };

    let half = width / 2.0;
    let mut quad_corners = Vec::with_capacity(vertex_pairs.len() * 2);
    let mut corner_colors = Vec::new();
    let mut kept = Vec::with_capacity(vertex_pairs.len());
    let mut kept_colors = Vec::new();

    for (i, pair) in vertex_pairs.chunks_exact(2).enumerate() {
        let (a, b) = (pair[0], pair[1]);
        let Some(direction) = (b - a).normalized() else {
            tracing::trace!(segment = i, "dropping zero-length segment");
            continue;
        };
        let offset = direction.perp() * half;
        quad_corners.extend_from_slice(&[a + offset, a - offset, b - offset, b + offset]);
        kept.extend_from_slice(&[a, b]);
        if let VertexColors::PerVertex(per_vertex) = &vertex_colors {
            let (ca, cb) = (per_vertex[2 * i], per_vertex[2 * i + 1]);
            corner_colors.extend_from_slice(&[ca, ca, cb, cb]);
            kept_colors.extend_from_slice(&[ca, cb]);
        }
    }

    let (quad_spec, cap_spec) = match vertex_colors {
        VertexColors::Uniform(color) => {
            let spec = colors.with_colors(vec![color]);
            (spec.clone(), spec)
        }
        VertexColors::PerVertex(_) => (
            colors.with_colors(corner_colors),
            colors.with_colors(kept_colors),
        ),
    };

    let body = expand_quads_from_corners(&quad_corners, &QuadPaint::Colors(quad_spec))?;
    let caps = if corner_type == CornerType::Rounded && !kept.is_empty() {
        Some(expand_arc_fan(
            &kept,
            &Radii::Shared(half),
            &AngleRanges::FULL_CIRCLE,
            &cap_spec,
            DEFAULT_ARC_SEGMENTS,
        )?)
    } else {
        None
    };
    Ok(StrokeGeometry { body, caps })
}

/// A connected polyline, optionally thickened.
///
/// Colors: one, or one per vertex. `FlatBrush` emits one triangle strip;
/// `Rounded` and `None` stroke each segment with [`expand_line_stroke`].
pub fn expand_line_strip_stroke(
    polyline: &[Vertex2],
    width: Option<f32>,
    colors: &ColorSpec,
    corner_type: CornerType,
    double_back: bool,
) -> Result<StrokeGeometry> {
    let n = polyline.len();
    if colors.len() > 1 && colors.len() != n {
        return Err(ShapeArityError::ColorCount {
            colors: colors.len(),
            vertices: n,
        }
        .into());
    }

    let Some(width) = width else {
        let colors_out = normalize_colors(colors, n, 1, None)?;
        let body = ShapeBuffer::new(
            PrimitiveKind::LineStrip,
            polyline.to_vec(),
            colors_out,
            colors.channels(),
        )?;
        return Ok(StrokeGeometry::plain(body));
    };

    match corner_type {
        CornerType::FlatBrush => Ok(StrokeGeometry::plain(flat_brush_strip(
            polyline,
            width,
            colors,
            double_back,
        )?)),
        CornerType::Rounded | CornerType::None => {
            if n < 2 {
                return Ok(StrokeGeometry::plain(ShapeBuffer::empty(
                    PrimitiveKind::Triangles,
                )));
            }
            let mut pairs = Vec::with_capacity(2 * (n - 1));
            for segment in polyline.windows(2) {
                pairs.extend_from_slice(segment);
            }
            let segment_colors = if colors.len() > 1 {
                let mut expanded = Vec::with_capacity(2 * (n - 1));
                for segment in colors.colors().windows(2) {
                    expanded.extend_from_slice(segment);
                }
                colors.with_colors(expanded)
            } else {
                colors.clone()
            };
            expand_line_stroke(&pairs, Some(width), &segment_colors, corner_type)
        }
    }
}

fn flat_brush_strip(
    polyline: &[Vertex2],
    width: f32,
    colors: &ColorSpec,
    double_back: bool,
) -> Result<ShapeBuffer> {
    let per_vertex = colors.len() > 1;
    let mut points = Vec::with_capacity(polyline.len());
    let mut point_colors = Vec::new();
    for (i, vertex) in polyline.iter().enumerate() {
        if i > 0 && *vertex == polyline[i - 1] {
            continue;
        }
        points.push(*vertex);
        if per_vertex {
            point_colors.push(colors.colors()[i]);
        }
    }

    let m = points.len();
    if m < 2 {
        tracing::trace!(points = m, "line strip has fewer than 2 distinct points");
        return Ok(ShapeBuffer::empty(PrimitiveKind::TriangleStrip));
    }

    let directions: Vec<Vertex2> = points
        .windows(2)
        .map(|s| (s[1] - s[0]).normalized().unwrap_or(Vertex2::new(1.0, 0.0)))
        .collect();

    let mut perps = Vec::with_capacity(m);
    let mut sharp = vec![false; m];
    perps.push(directions[0].perp());
    for k in 1..m - 1 {
        let (d1, d2) = (directions[k - 1], directions[k]);
        let is_sharp = (d1 - d2).length() > SHARP_TURN;
        sharp[k] = is_sharp;
        let sum = if double_back && is_sharp { -d1 + d2 } else { d1 + d2 };
        // Exact reversal without double-back averages to zero
        let average = (sum * 0.5).normalized().unwrap_or(d1);
        perps.push(average.perp());
    }
    perps.push(directions[m - 2].perp());

    let half = width / 2.0;
    let mut strip = Vec::with_capacity(2 * m);
    let mut flipped = false;
    for (k, (vertex, perp)) in points.iter().zip(&perps).enumerate() {
        if double_back && sharp[k] {
            flipped = !flipped;
        }
        let low = *vertex - *perp * half;
        let high = *vertex + *perp * half;
        if flipped {
            strip.extend_from_slice(&[high, low]);
        } else {
            strip.extend_from_slice(&[low, high]);
        }
    }

    let strip_colors = if per_vertex {
        repeat_each(&point_colors, 2)
    } else {
        normalize_colors(colors, strip.len(), 1, None)?
    };
    Ok(ShapeBuffer::new(
        PrimitiveKind::TriangleStrip,
        strip,
        strip_colors,
        colors.channels(),
    )?)
}

/// One triangle fan per center: the center, then `num_segments + 1`
/// perimeter points across the angle range.
///
/// Colors: one, one per arc, or an (inner, outer) pair per arc.
pub fn expand_arc_fan(
    centers: &[Vertex2],
    radii: &Radii,
    angles: &AngleRanges,
    colors: &ColorSpec,
    num_segments: u32,
) -> Result<ShapeBuffer> {
    if num_segments < 2 {
        return Err(ShapeArityError::TooFewSegments(num_segments).into());
    }
    let n = centers.len();
    let radii = radii.resolve(n)?;
    let ranges = angles.resolve(n)?;
    let fan_len = num_segments as usize + 2;

    let mut vertices = Vec::with_capacity(n * fan_len);
    for ((center, radius), range) in centers.iter().zip(&radii).zip(&ranges) {
        vertices.push(*center);
        for i in 0..=num_segments {
            vertices.push(perimeter_point(*center, *radius, *range, i, num_segments));
        }
    }

    let colors_out = match colors.len() {
        0 | 1 => normalize_colors(colors, vertices.len(), 1, None)?,
        c if c == n => repeat_each(colors.colors(), fan_len),
        c if c == 2 * n => {
            let mut out = Vec::with_capacity(vertices.len());
            for pair in colors.colors().chunks_exact(2) {
                out.push(pair[0]);
                out.extend(std::iter::repeat(pair[1]).take(fan_len - 1));
            }
            out
        }
        c => {
            return Err(ShapeArityError::ColorCount {
                colors: c,
                vertices: n,
            }
            .into())
        }
    };

    let buffer = ShapeBuffer::new(
        PrimitiveKind::TriangleFan,
        vertices,
        colors_out,
        colors.channels(),
    )?;
    if n > 1 {
        Ok(buffer.with_sub_ranges(SubRange::uniform(n, fan_len))?)
    } else {
        Ok(buffer)
    }
}

/// One triangle strip per ring, alternating inner and outer edge vertices.
///
/// The range is cut into `2 * num_segments - 1` pieces; the inner edge uses
/// the start angle and every odd cut, the outer edge every even cut and the
/// end angle, so both edges share the end angles.
///
/// Colors: one, one per ring, or an (inner, outer) pair per ring.
pub fn expand_ring_strip(
    centers: &[Vertex2],
    inner_radii: &Radii,
    outer_radii: &Radii,
    angles: &AngleRanges,
    colors: &ColorSpec,
    num_segments: u32,
) -> Result<ShapeBuffer> {
    if num_segments < 2 {
        return Err(ShapeArityError::TooFewSegments(num_segments).into());
    }
    let n = centers.len();
    let inner = inner_radii.resolve(n)?;
    let outer = outer_radii.resolve(n)?;
    let ranges = angles.resolve(n)?;
    let segments = num_segments;
    let pieces = 2 * segments - 1;
    let ring_len = 2 * (segments as usize + 1);

    let mut vertices = Vec::with_capacity(n * ring_len);
    for (i, center) in centers.iter().enumerate() {
        for j in 0..=segments {
            let inner_step = if j == 0 { 0 } else { 2 * j - 1 };
            let outer_step = if j == segments { pieces } else { 2 * j };
            vertices.push(perimeter_point(*center, inner[i], ranges[i], inner_step, pieces));
            vertices.push(perimeter_point(*center, outer[i], ranges[i], outer_step, pieces));
        }
    }

    let colors_out = match colors.len() {
        0 | 1 => normalize_colors(colors, vertices.len(), 1, None)?,
        c if c == n => repeat_each(colors.colors(), ring_len),
        c if c == 2 * n => {
            let mut out = Vec::with_capacity(vertices.len());
            for pair in colors.colors().chunks_exact(2) {
                for _ in 0..ring_len / 2 {
                    out.extend_from_slice(pair);
                }
            }
            out
        }
        c => {
            return Err(ShapeArityError::ColorCount {
                colors: c,
                vertices: n,
            }
            .into())
        }
    };

    let buffer = ShapeBuffer::new(
        PrimitiveKind::TriangleStrip,
        vertices,
        colors_out,
        colors.channels(),
    )?;
    if n > 1 {
        Ok(buffer.with_sub_ranges(SubRange::uniform(n, ring_len))?)
    } else {
        Ok(buffer)
    }
}

/// Rectangle corners `(x, y) (x, y+h) (x+w, y+h) (x+w, y)` per location.
///
/// `dimensions` holds one `(w, h)` per location or one shared size.
pub fn rect_corners(
    locations: &[Vertex2],
    dimensions: &[(f32, f32)],
    center_anchored: bool,
) -> Result<Vec<Vertex2>> {
    if dimensions.len() != 1 && dimensions.len() != locations.len() {
        return Err(ShapeArityError::DimensionCount {
            dimensions: dimensions.len(),
            locations: locations.len(),
        }
        .into());
    }
    let mut corners = Vec::with_capacity(locations.len() * 4);
    for (i, location) in locations.iter().enumerate() {
        let (w, h) = dimensions[if dimensions.len() == 1 { 0 } else { i }];
        let origin = if center_anchored {
            *location - Vertex2::new(w / 2.0, h / 2.0)
        } else {
            *location
        };
        corners.extend_from_slice(&[
            origin,
            origin + Vertex2::new(0.0, h),
            origin + Vertex2::new(w, h),
            origin + Vertex2::new(w, 0.0),
        ]);
    }
    Ok(corners)
}
