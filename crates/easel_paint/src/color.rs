//! Color lists and their expansion to per-vertex arrays

use smallvec::SmallVec;

use easel_core::{Channels, Color};

use crate::buffer::SubRange;
use crate::error::ShapeArityError;

/// An ordered list of colors sharing one channel count.
///
/// How many colors there are decides how they apply: one for the whole
/// shape, one per vertex, or one per primitive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColorSpec {
    colors: SmallVec<[Color; 4]>,
    channels: Channels,
}

impl ColorSpec {
    /// No colors: black for plain shapes, texture modulation for textured ones
    pub fn none() -> Self {
        Self::default()
    }

    pub fn solid(color: Color) -> Self {
        Self::list(vec![color], Channels::Rgba)
    }

    pub fn list(colors: Vec<Color>, channels: Channels) -> Self {
        Self {
            colors: SmallVec::from_vec(colors),
            channels,
        }
    }

    pub fn rgb(colors: &[[f32; 3]]) -> Self {
        Self {
            colors: colors.iter().map(|c| Color::from(*c)).collect(),
            channels: Channels::Rgb,
        }
    }

    pub fn rgba(colors: &[[f32; 4]]) -> Self {
        Self {
            colors: colors.iter().map(|c| Color::from(*c)).collect(),
            channels: Channels::Rgba,
        }
    }

    /// Build from raw tuples, rejecting bad or mixed component counts
    pub fn from_components(tuples: &[Vec<f32>]) -> Result<Self, ShapeArityError> {
        let mut channels = None;
        let mut colors = SmallVec::with_capacity(tuples.len());
        for (index, tuple) in tuples.iter().enumerate() {
            let this = Channels::from_count(tuple.len()).ok_or(ShapeArityError::ComponentCount {
                index,
                count: tuple.len(),
            })?;
            match channels {
                None => channels = Some(this),
                Some(expected) if expected != this => {
                    return Err(ShapeArityError::MixedChannels {
                        index,
                        expected: expected.count(),
                        found: this.count(),
                    });
                }
                Some(_) => {}
            }
            let color = Color::from_components(tuple).ok_or(ShapeArityError::ComponentCount {
                index,
                count: tuple.len(),
            })?;
            colors.push(color);
        }
        Ok(Self {
            colors,
            channels: channels.unwrap_or_default(),
        })
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The only color, when the list holds exactly one
    pub fn single(&self) -> Option<Color> {
        match self.colors.as_slice() {
            [color] => Some(*color),
            _ => None,
        }
    }

    /// Same channel tag, different colors
    pub(crate) fn with_colors(&self, colors: Vec<Color>) -> Self {
        Self::list(colors, self.channels)
    }
}

impl From<Color> for ColorSpec {
    fn from(color: Color) -> Self {
        Self::solid(color)
    }
}

impl From<[f32; 3]> for ColorSpec {
    fn from(color: [f32; 3]) -> Self {
        Self::rgb(&[color])
    }
}

impl From<[f32; 4]> for ColorSpec {
    fn from(color: [f32; 4]) -> Self {
        Self::rgba(&[color])
    }
}

impl From<Vec<Color>> for ColorSpec {
    fn from(colors: Vec<Color>) -> Self {
        Self::list(colors, Channels::Rgba)
    }
}

impl From<&[Color]> for ColorSpec {
    fn from(colors: &[Color]) -> Self {
        Self::list(colors.to_vec(), Channels::Rgba)
    }
}

impl From<&ColorSpec> for ColorSpec {
    fn from(spec: &ColorSpec) -> Self {
        spec.clone()
    }
}

/// Expand `spec` to exactly one color per vertex.
///
/// Accepted forms, checked in order: none (black), one, one per vertex, one
/// per `element_length` vertices, one per sub-range.
pub fn normalize_colors(
    spec: &ColorSpec,
    vertex_count: usize,
    element_length: usize,
    sub_ranges: Option<&[SubRange]>,
) -> Result<Vec<Color>, ShapeArityError> {
    let colors = spec.colors();
    let n = colors.len();

    if n == 0 {
        return Ok(vec![Color::BLACK; vertex_count]);
    }
    if n == 1 {
        return Ok(vec![colors[0]; vertex_count]);
    }
    if n == vertex_count {
        return Ok(colors.to_vec());
    }
    if element_length > 1 && n * element_length == vertex_count {
        return Ok(repeat_each(colors, element_length));
    }
    if let Some(ranges) = sub_ranges {
        if n == ranges.len() {
            let mut out = Vec::with_capacity(vertex_count);
            for (color, range) in colors.iter().zip(ranges) {
                out.extend(std::iter::repeat(*color).take(range.count));
            }
            if out.len() == vertex_count {
                return Ok(out);
            }
        }
    }
    Err(ShapeArityError::ColorCount {
        colors: n,
        vertices: vertex_count,
    })
}

/// Every item repeated `times` times in place
pub(crate) fn repeat_each<T: Copy>(items: &[T], times: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(items.len() * times);
    for item in items {
        out.extend(std::iter::repeat(*item).take(times));
    }
    out
}
