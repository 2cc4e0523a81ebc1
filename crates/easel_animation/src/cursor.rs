//! Independent playback heads over a shared frame set
//!
//! A cursor is written by exactly one tick task and read by the rendering
//! thread. Reads are plain atomic loads; the frame index is stored in a single
//! atomic write and is always a valid index into the frame set.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use easel_core::TextureId;

use crate::frames::{AnimatedFrameSet, AnimationFrame};

/// What a single tick did to the cursor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Moved to the next frame
    Advanced { from: usize, to: usize },
    /// Wrapped from the last frame back to frame 0
    Wrapped,
    /// On the last frame with no loops left; nothing changed
    Held,
    /// The cursor was not running; nothing changed
    Stopped,
}

/// A playback position into an [`AnimatedFrameSet`]
#[derive(Debug)]
pub struct PlaybackCursor {
    frames: Arc<AnimatedFrameSet>,
    current: AtomicUsize,
    loops_remaining: AtomicI32,
    running: AtomicBool,
    /// Serializes tick application against `start`/`stop`
    write_guard: Mutex<()>,
}

impl PlaybackCursor {
    pub fn new(frames: Arc<AnimatedFrameSet>) -> Self {
        Self {
            frames,
            current: AtomicUsize::new(0),
            loops_remaining: AtomicI32::new(0),
            running: AtomicBool::new(false),
            write_guard: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guard protects no data of its own, so a poisoned lock is still usable
        self.write_guard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Begin (or resume) playback, re-arming the loop counter from the frame set.
    ///
    /// Returns `true` if the cursor was stopped before the call.
    pub fn start(&self) -> bool {
        let _guard = self.lock();
        self.loops_remaining
            .store(self.frames.loop_count(), Ordering::Release);
        !self.running.swap(true, Ordering::AcqRel)
    }

    /// Stop without touching the position. No tick applies after this returns.
    pub fn stop(&self) {
        let _guard = self.lock();
        self.running.store(false, Ordering::Release);
    }

    /// Jump back to frame 0 whether running or not
    pub fn reset(&self) {
        let _guard = self.lock();
        self.current.store(0, Ordering::Release);
    }

    /// Apply one timer tick
    pub fn tick(&self) -> TickOutcome {
        let _guard = self.lock();
        if !self.running.load(Ordering::Acquire) {
            return TickOutcome::Stopped;
        }

        let current = self.current.load(Ordering::Acquire);
        let last = self.frames.last_index();
        if current < last {
            self.current.store(current + 1, Ordering::Release);
            return TickOutcome::Advanced {
                from: current,
                to: current + 1,
            };
        }

        let loops = self.loops_remaining.load(Ordering::Acquire);
        if loops < 0 {
            self.current.store(0, Ordering::Release);
            TickOutcome::Wrapped
        } else if loops > 0 {
            self.current.store(0, Ordering::Release);
            self.loops_remaining.store(loops - 1, Ordering::Release);
            TickOutcome::Wrapped
        } else {
            TickOutcome::Held
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn current_frame_index(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    pub fn loops_remaining(&self) -> i32 {
        self.loops_remaining.load(Ordering::Acquire)
    }

    pub fn current_frame(&self) -> &AnimationFrame {
        self.frames.frame(self.current_frame_index())
    }

    pub fn current_texture(&self) -> TextureId {
        self.current_frame().texture
    }

    /// How long the current frame stays on screen
    pub fn current_delay(&self) -> Duration {
        self.current_frame().delay
    }

    pub fn frame_set(&self) -> &Arc<AnimatedFrameSet> {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::test_support::frame_set;

    #[test]
    fn test_play_once_holds_on_last_frame() {
        let cursor = PlaybackCursor::new(frame_set(&[100, 100, 100], 0));
        assert!(cursor.start());

        assert_eq!(cursor.tick(), TickOutcome::Advanced { from: 0, to: 1 });
        assert_eq!(cursor.tick(), TickOutcome::Advanced { from: 1, to: 2 });
        for _ in 0..10 {
            assert_eq!(cursor.tick(), TickOutcome::Held);
        }
        assert_eq!(cursor.current_frame_index(), 2);
        assert!(cursor.is_running());
    }

    #[test]
    fn test_finite_loops_decrement_then_hold() {
        let cursor = PlaybackCursor::new(frame_set(&[50, 50], 2));
        cursor.start();
        assert_eq!(cursor.loops_remaining(), 2);

        let outcomes: Vec<_> = (0..8).map(|_| cursor.tick()).collect();
        let wraps = outcomes
            .iter()
            .filter(|o| **o == TickOutcome::Wrapped)
            .count();
        assert_eq!(wraps, 2);
        assert_eq!(cursor.loops_remaining(), 0);
        assert_eq!(cursor.current_frame_index(), 1);
        assert_eq!(outcomes.last(), Some(&TickOutcome::Held));
    }

    #[test]
    fn test_infinite_loop_never_holds() {
        let cursor = PlaybackCursor::new(frame_set(&[10, 10, 10], -1));
        cursor.start();
        for _ in 0..30 {
            assert_ne!(cursor.tick(), TickOutcome::Held);
        }
        assert_eq!(cursor.current_frame_index(), 0);
        assert_eq!(cursor.loops_remaining(), -1);
    }

    #[test]
    fn test_stop_keeps_position_and_blocks_ticks() {
        let cursor = PlaybackCursor::new(frame_set(&[10, 10, 10], -1));
        cursor.start();
        cursor.tick();
        cursor.stop();

        assert_eq!(cursor.tick(), TickOutcome::Stopped);
        assert_eq!(cursor.current_frame_index(), 1);
        assert_eq!(cursor.current_texture(), TextureId(101));
    }

    #[test]
    fn test_reset_while_running_and_stopped() {
        let cursor = PlaybackCursor::new(frame_set(&[10, 10, 10], -1));
        cursor.start();
        cursor.tick();
        cursor.tick();
        cursor.reset();
        assert_eq!(cursor.current_frame_index(), 0);

        cursor.tick();
        cursor.stop();
        cursor.reset();
        assert_eq!(cursor.current_frame_index(), 0);
        assert!(!cursor.is_running());
    }

    #[test]
    fn test_cursors_share_frames_independently() {
        let frames = frame_set(&[10, 20, 30], -1);
        let a = PlaybackCursor::new(frames.clone());
        let b = PlaybackCursor::new(frames.clone());
        a.start();
        b.start();

        a.tick();
        a.tick();
        b.tick();

        assert_eq!(a.current_frame_index(), 2);
        assert_eq!(b.current_frame_index(), 1);
        assert_eq!(a.current_delay(), Duration::from_millis(30));
        assert!(Arc::ptr_eq(a.frame_set(), b.frame_set()));
    }

    #[test]
    fn test_start_while_running_rearms_loops() {
        let cursor = PlaybackCursor::new(frame_set(&[10, 10], 1));
        assert!(cursor.start());
        cursor.tick();
        cursor.tick();
        assert_eq!(cursor.loops_remaining(), 0);

        assert!(!cursor.start());
        assert_eq!(cursor.loops_remaining(), 1);
    }
}
