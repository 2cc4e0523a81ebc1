//! Paint error types

use std::path::PathBuf;

use thiserror::Error;

/// Array lengths that do not fit together
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeArityError {
    /// Vertex count is not a multiple of what the primitive needs
    #[error("{what} needs a multiple of {multiple} vertices, got {count}")]
    VertexCount {
        what: &'static str,
        multiple: usize,
        count: usize,
    },

    /// Color count matches none of the accepted forms
    #[error("{colors} colors do not fit {vertices} vertices")]
    ColorCount { colors: usize, vertices: usize },

    /// A color tuple with neither 3 nor 4 components
    #[error("color {index} has {count} components, expected 3 or 4")]
    ComponentCount { index: usize, count: usize },

    /// RGB and RGBA tuples in one color list
    #[error("color {index} has {found} components but earlier colors have {expected}")]
    MixedChannels {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("{tex_coords} texture coordinates for {vertices} vertices")]
    TexCoordCount { tex_coords: usize, vertices: usize },

    /// Sub-ranges must be ordered, contiguous and cover the whole buffer
    #[error("sub-range {index} breaks the layout of a {len} vertex buffer")]
    SubRangeLayout { index: usize, len: usize },

    #[error("{radii} radii for {centers} centers")]
    RadiusCount { radii: usize, centers: usize },

    #[error("{ranges} angle ranges for {centers} centers")]
    AngleCount { ranges: usize, centers: usize },

    #[error("{dimensions} dimensions for {locations} locations")]
    DimensionCount { dimensions: usize, locations: usize },

    #[error("at least 2 segments are required, got {0}")]
    TooFewSegments(u32),
}

/// Rasterizer backend failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Texture creation failed: {0}")]
    TextureCreation(String),

    #[error("Backend error: {0}")]
    Other(String),
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse canvas config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize canvas config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid canvas config: {0}")]
    Invalid(String),
}

/// Paint-level errors
#[derive(Error, Debug)]
pub enum PaintError {
    #[error(transparent)]
    Arity(#[from] ShapeArityError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Image(#[from] easel_image::ImageError),

    #[error(transparent)]
    Animation(#[from] easel_animation::AnimationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for paint operations
pub type Result<T> = std::result::Result<T, PaintError>;
