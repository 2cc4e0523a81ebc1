//! Easel Animation System
//!
//! Animated textures whose decoded frames are shared between any number of
//! independent playback cursors.
//!
//! # Features
//!
//! - **Frame Sets**: Immutable decoded frames, delays and texture handles behind `Arc`
//! - **Cursors**: Independent playback heads with loop counting and lock-free reads
//! - **Schedulers**: `register_periodic` over OS threads, or tokio tasks with the `tokio` feature
//! - **Pacing**: Deadline-converging sleeps that never oversleep a frame by much
//! - **Layers**: Per-frame `(dt, elapsed)` callbacks that retire themselves

pub mod arena;
pub mod cursor;
pub mod error;
pub mod frames;
pub mod layers;
pub mod pacing;
pub mod scheduler;

pub use arena::{CursorArena, CursorId};
pub use cursor::{PlaybackCursor, TickOutcome};
pub use error::{AnimationError, Result};
pub use frames::{AnimatedFrameSet, AnimationFrame};
pub use layers::AnimationLayers;
pub use pacing::{pace_step, Clock, FramePacer, PaceReport, PaceStep, SystemClock};
pub use scheduler::{CancellationToken, ThreadScheduler, TickCallback, TickControl, TickScheduler};

#[cfg(feature = "tokio")]
pub use scheduler::TokioScheduler;
