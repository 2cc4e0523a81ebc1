//! Easel Core
//!
//! Plain data types shared by every Easel crate:
//!
//! - **Vertices**: `Vertex2` and `TexCoord`, laid out for direct upload
//! - **Colors**: `Color` with a `Channels` tag for RGB vs RGBA data
//! - **Textures**: `TextureId`, the opaque handle a rasterizer backend hands out

pub mod color;
pub mod texture;
pub mod vertex;

pub use color::{Channels, Color};
pub use texture::TextureId;
pub use vertex::{TexCoord, Vertex2};
