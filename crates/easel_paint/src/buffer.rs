//! Expanded vertex buffers ready for submission

use std::borrow::Cow;

use easel_core::{Channels, Color, TexCoord, Vertex2};

use crate::error::ShapeArityError;

/// Draw-call topology
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Points,
    Lines,
    LineStrip,
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl PrimitiveKind {
    /// Vertices per independent element (2 for lines, 3 for triangles, else 1)
    pub const fn element_length(self) -> usize {
        match self {
            PrimitiveKind::Lines => 2,
            PrimitiveKind::Triangles => 3,
            _ => 1,
        }
    }

    /// Kinds affected by the line width
    pub const fn is_line(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Lines | PrimitiveKind::LineStrip | PrimitiveKind::LineLoop
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Points => "points",
            PrimitiveKind::Lines => "lines",
            PrimitiveKind::LineStrip => "line strip",
            PrimitiveKind::LineLoop => "line loop",
            PrimitiveKind::Triangles => "triangles",
            PrimitiveKind::TriangleStrip => "triangle strip",
            PrimitiveKind::TriangleFan => "triangle fan",
        }
    }
}

/// A contiguous run of vertices drawn as one primitive in a batched draw
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubRange {
    pub start: usize,
    pub count: usize,
}

impl SubRange {
    pub const fn new(start: usize, count: usize) -> Self {
        Self { start, count }
    }

    pub const fn end(self) -> usize {
        self.start + self.count
    }

    /// Ranges from ascending start indices; the last range runs to `len`
    pub fn from_starts(starts: &[usize], len: usize) -> Result<Vec<SubRange>, ShapeArityError> {
        let mut ranges = Vec::with_capacity(starts.len());
        for (index, start) in starts.iter().enumerate() {
            let end = starts.get(index + 1).copied().unwrap_or(len);
            if end < *start || end > len {
                return Err(ShapeArityError::SubRangeLayout { index, len });
            }
            ranges.push(SubRange::new(*start, end - start));
        }
        Ok(ranges)
    }

    /// `count` equal ranges of `size` vertices
    pub fn uniform(count: usize, size: usize) -> Vec<SubRange> {
        (0..count).map(|i| SubRange::new(i * size, size)).collect()
    }
}

/// Vertices plus per-vertex attributes for one draw call.
///
/// Construction validates the layout, so every buffer handed to a backend is
/// well formed.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeBuffer {
    kind: PrimitiveKind,
    vertices: Vec<Vertex2>,
    colors: Vec<Color>,
    channels: Channels,
    tex_coords: Option<Vec<TexCoord>>,
    sub_ranges: Option<Vec<SubRange>>,
}

impl ShapeBuffer {
    /// `colors` must be empty or hold one color per vertex
    pub fn new(
        kind: PrimitiveKind,
        vertices: Vec<Vertex2>,
        colors: Vec<Color>,
        channels: Channels,
    ) -> Result<Self, ShapeArityError> {
        let element = kind.element_length();
        if element > 1 && vertices.len() % element != 0 {
            return Err(ShapeArityError::VertexCount {
                what: kind.name(),
                multiple: element,
                count: vertices.len(),
            });
        }
        if !colors.is_empty() && colors.len() != vertices.len() {
            return Err(ShapeArityError::ColorCount {
                colors: colors.len(),
                vertices: vertices.len(),
            });
        }
        Ok(Self {
            kind,
            vertices,
            colors,
            channels,
            tex_coords: None,
            sub_ranges: None,
        })
    }

    /// A buffer with nothing to draw
    pub fn empty(kind: PrimitiveKind) -> Self {
        Self {
            kind,
            vertices: Vec::new(),
            colors: Vec::new(),
            channels: Channels::Rgba,
            tex_coords: None,
            sub_ranges: None,
        }
    }

    pub fn with_tex_coords(mut self, tex_coords: Vec<TexCoord>) -> Result<Self, ShapeArityError> {
        if tex_coords.len() != self.vertices.len() {
            return Err(ShapeArityError::TexCoordCount {
                tex_coords: tex_coords.len(),
                vertices: self.vertices.len(),
            });
        }
        self.tex_coords = Some(tex_coords);
        Ok(self)
    }

    /// Attach batched-draw ranges. An empty list means a single draw.
    pub fn with_sub_ranges(mut self, ranges: Vec<SubRange>) -> Result<Self, ShapeArityError> {
        if ranges.is_empty() {
            self.sub_ranges = None;
            return Ok(self);
        }
        let len = self.vertices.len();
        let mut expected = 0;
        for (index, range) in ranges.iter().enumerate() {
            if range.start != expected || range.end() > len {
                return Err(ShapeArityError::SubRangeLayout { index, len });
            }
            expected = range.end();
        }
        if expected != len {
            return Err(ShapeArityError::SubRangeLayout {
                index: ranges.len() - 1,
                len,
            });
        }
        self.sub_ranges = Some(ranges);
        Ok(self)
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    pub fn vertices(&self) -> &[Vertex2] {
        &self.vertices
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn tex_coords(&self) -> Option<&[TexCoord]> {
        self.tex_coords.as_deref()
    }

    pub fn sub_ranges(&self) -> Option<&[SubRange]> {
        self.sub_ranges.as_deref()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn tex_coord_bytes(&self) -> Option<&[u8]> {
        self.tex_coords.as_deref().map(bytemuck::cast_slice)
    }

    /// Color data packed with `channels()` components per vertex
    pub fn color_bytes(&self) -> Cow<'_, [u8]> {
        match self.channels {
            Channels::Rgba => Cow::Borrowed(bytemuck::cast_slice(&self.colors)),
            Channels::Rgb => {
                let packed: Vec<[f32; 3]> =
                    self.colors.iter().map(|color| color.to_rgb_array()).collect();
                Cow::Owned(bytemuck::cast_slice(&packed).to_vec())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verts(n: usize) -> Vec<Vertex2> {
        (0..n).map(|i| Vertex2::new(i as f32, 0.0)).collect()
    }

    #[test]
    fn test_triangle_count_checked() {
        let err = ShapeBuffer::new(PrimitiveKind::Triangles, verts(4), Vec::new(), Channels::Rgba)
            .unwrap_err();
        assert_eq!(
            err,
            ShapeArityError::VertexCount {
                what: "triangles",
                multiple: 3,
                count: 4
            }
        );
        let fan = ShapeBuffer::new(
            PrimitiveKind::TriangleFan,
            verts(4),
            Vec::new(),
            Channels::Rgba,
        );
        assert!(fan.is_ok());
    }

    #[test]
    fn test_colors_empty_or_per_vertex() {
        let points = |colors: Vec<Color>| {
            ShapeBuffer::new(PrimitiveKind::Points, verts(3), colors, Channels::Rgba)
        };
        assert!(points(vec![Color::RED; 3]).is_ok());
        assert!(points(vec![Color::RED; 2]).is_err());
        assert!(points(Vec::new()).is_ok());
    }

    #[test]
    fn test_sub_ranges_must_cover_buffer() {
        let buffer = ShapeBuffer::new(
            PrimitiveKind::TriangleFan,
            verts(6),
            Vec::new(),
            Channels::Rgba,
        )
        .unwrap();
        assert!(buffer
            .clone()
            .with_sub_ranges(vec![SubRange::new(0, 3), SubRange::new(3, 3)])
            .is_ok());
        // gap
        assert!(buffer
            .clone()
            .with_sub_ranges(vec![SubRange::new(0, 2), SubRange::new(3, 3)])
            .is_err());
        // short
        assert!(buffer
            .clone()
            .with_sub_ranges(vec![SubRange::new(0, 3)])
            .is_err());
        // overrun
        assert!(buffer
            .with_sub_ranges(vec![SubRange::new(0, 3), SubRange::new(3, 4)])
            .is_err());
    }

    #[test]
    fn test_ranges_from_starts() {
        let ranges = SubRange::from_starts(&[0, 4, 6], 10).unwrap();
        assert_eq!(
            ranges,
            vec![SubRange::new(0, 4), SubRange::new(4, 2), SubRange::new(6, 4)]
        );
        assert!(SubRange::from_starts(&[0, 12], 10).is_err());
    }

    #[test]
    fn test_tex_coords_match_vertices() {
        let buffer = ShapeBuffer::new(
            PrimitiveKind::Points,
            verts(2),
            Vec::new(),
            Channels::Rgba,
        )
        .unwrap();
        assert!(buffer.clone().with_tex_coords(vec![TexCoord::new(0.0, 0.0)]).is_err());
        let textured = buffer
            .with_tex_coords(vec![TexCoord::new(0.0, 0.0), TexCoord::new(1.0, 1.0)])
            .unwrap();
        assert_eq!(textured.tex_coord_bytes().map(|b| b.len()), Some(16));
    }

    #[test]
    fn test_rgb_bytes_are_packed() {
        let buffer = ShapeBuffer::new(
            PrimitiveKind::Points,
            verts(2),
            vec![Color::RED; 2],
            Channels::Rgb,
        )
        .unwrap();
        assert_eq!(buffer.color_bytes().len(), 2 * 3 * 4);
        assert_eq!(buffer.vertex_bytes().len(), 2 * 2 * 4);
    }
}
