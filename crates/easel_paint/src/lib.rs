//! Easel Paint Layer
//!
//! An immediate-mode 2D drawing layer: draw calls expand high-level shapes
//! into vertex buffers, and a paint pass hands them to a raster backend.
//!
//! # Features
//!
//! - **Geometry**: Thick points, quads, strokes with rounded or brushed corners, arcs and rings
//! - **Colors**: One color, one per vertex, or one per element
//! - **Textures**: Still and animated images with independent playback cursors
//! - **Text**: View-space sizing and nine anchors
//! - **View**: World bounds mapped to the device, with resize policies
//! - **Backends**: A narrow `RasterBackend` trait plus a recording backend for tests

pub mod backend;
pub mod buffer;
pub mod canvas;
pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod shape;
pub mod text;
pub mod texture;
pub mod view;

pub use backend::{
    BackendCall, ClientArray, FrameSetup, RasterBackend, RecordingBackend, TextBounds, TextRun,
    TextureBlend, TextureUpload,
};
pub use buffer::{PrimitiveKind, ShapeBuffer, SubRange};
pub use canvas::{Canvas, ShapeList};
pub use color::{normalize_colors, ColorSpec};
pub use config::CanvasConfig;
pub use error::{BackendError, ConfigError, PaintError, Result, ShapeArityError};
pub use geometry::{AngleRanges, CornerType, QuadPaint, Radii, StrokeGeometry};
pub use shape::{DepthTest, GeometryShape, Shape, TextureBinding};
pub use text::{FontSpec, TextAnchor, TextShape, TextSize};
pub use texture::{StillTexture, TextureHandler, TextureRef, TextureRegistry};
pub use view::{DeviceSize, ResizePolicy, ViewBounds, ViewTransform};

pub use easel_core::{Channels, Color, TexCoord, TextureId, Vertex2};
pub use easel_image::ImageSource;
