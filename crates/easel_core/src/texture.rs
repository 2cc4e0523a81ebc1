//! Backend texture handles

/// Opaque handle to a texture created by a rasterizer backend.
///
/// Handles are immutable once created and may be shared freely between the
/// rendering thread and animation tick threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

impl TextureId {
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TextureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tex#{}", self.0)
    }
}
