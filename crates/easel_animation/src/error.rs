use thiserror::Error;

/// Animation setup errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimationError {
    /// A frame set must hold at least one frame
    #[error("animated frame set has no frames")]
    NoFrames,
}

pub type Result<T> = std::result::Result<T, AnimationError>;
