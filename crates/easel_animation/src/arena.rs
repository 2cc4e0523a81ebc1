//! Cursor ownership and tick task lifetimes
//!
//! The arena tracks every cursor created for a canvas together with the
//! cancellation token of its tick task. Shared cursors are owned by the
//! arena; leased cursors are owned by whoever holds the returned `Arc`, and
//! their entries are pruned once the last holder drops them. Stopping or
//! dropping the arena retires all background work.

use std::sync::{Arc, Weak};

use slotmap::{new_key_type, SlotMap};

use crate::cursor::{PlaybackCursor, TickOutcome};
use crate::frames::AnimatedFrameSet;
use crate::scheduler::{CancellationToken, ThreadScheduler, TickControl, TickScheduler};

new_key_type! {
    pub struct CursorId;
}

struct CursorEntry {
    cursor: Weak<PlaybackCursor>,
    /// Present for cursors the arena itself keeps alive
    owned: Option<Arc<PlaybackCursor>>,
    token: Option<CancellationToken>,
}

impl CursorEntry {
    fn retire_task(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }

    fn live(&self) -> Option<Arc<PlaybackCursor>> {
        self.cursor.upgrade()
    }
}

/// Tracks cursors and drives them through a [`TickScheduler`]
pub struct CursorArena {
    scheduler: Arc<dyn TickScheduler>,
    cursors: SlotMap<CursorId, CursorEntry>,
}

impl CursorArena {
    pub fn new(scheduler: Arc<dyn TickScheduler>) -> Self {
        Self {
            scheduler,
            cursors: SlotMap::with_key(),
        }
    }

    /// Arena backed by one OS thread per playing cursor
    pub fn with_threads() -> Self {
        Self::new(Arc::new(ThreadScheduler::new()))
    }

    /// Create a stopped cursor at frame 0, kept alive by the arena
    pub fn insert(&mut self, frames: Arc<AnimatedFrameSet>) -> CursorId {
        self.prune();
        let cursor = Arc::new(PlaybackCursor::new(frames));
        self.cursors.insert(CursorEntry {
            cursor: Arc::downgrade(&cursor),
            owned: Some(cursor),
            token: None,
        })
    }

    /// Create a stopped cursor at frame 0 owned by the caller.
    ///
    /// The entry lives until the returned `Arc` and all its clones are gone.
    pub fn lease(&mut self, frames: Arc<AnimatedFrameSet>) -> (CursorId, Arc<PlaybackCursor>) {
        self.prune();
        let cursor = Arc::new(PlaybackCursor::new(frames));
        let id = self.cursors.insert(CursorEntry {
            cursor: Arc::downgrade(&cursor),
            owned: None,
            token: None,
        });
        (id, cursor)
    }

    pub fn cursor(&self, id: CursorId) -> Option<Arc<PlaybackCursor>> {
        self.cursors.get(id).and_then(CursorEntry::live)
    }

    /// Start playback. Starting a running cursor only re-arms its loop counter.
    pub fn start(&mut self, id: CursorId) -> bool {
        self.prune();
        let Some(entry) = self.cursors.get_mut(id) else {
            return false;
        };
        let Some(cursor) = entry.live() else {
            return false;
        };
        let was_stopped = cursor.start();
        let has_task = entry
            .token
            .as_ref()
            .is_some_and(|token| !token.is_cancelled());
        if !was_stopped && has_task {
            return true;
        }

        entry.retire_task();
        let first_interval = cursor.current_delay();
        let weak = Arc::downgrade(&cursor);
        let token = self.scheduler.register_periodic(
            first_interval,
            Box::new(move || {
                let Some(cursor) = weak.upgrade() else {
                    return TickControl::Stop;
                };
                match cursor.tick() {
                    TickOutcome::Stopped => TickControl::Stop,
                    outcome => {
                        tracing::trace!(?outcome, "cursor tick");
                        TickControl::Continue(cursor.current_delay())
                    }
                }
            }),
        );
        entry.token = Some(token);
        true
    }

    /// Stop playback; the tick task is cancelled and the position kept
    pub fn stop(&mut self, id: CursorId) -> bool {
        let Some(entry) = self.cursors.get_mut(id) else {
            return false;
        };
        let Some(cursor) = entry.live() else {
            return false;
        };
        cursor.stop();
        entry.retire_task();
        true
    }

    pub fn reset(&self, id: CursorId) -> bool {
        match self.cursor(id) {
            Some(cursor) => {
                cursor.reset();
                true
            }
            None => false,
        }
    }

    /// Stop and forget a cursor. Other holders of its `Arc` keep a frozen cursor.
    pub fn remove(&mut self, id: CursorId) -> Option<Arc<PlaybackCursor>> {
        let mut entry = self.cursors.remove(id)?;
        entry.retire_task();
        let cursor = entry.live()?;
        cursor.stop();
        Some(cursor)
    }

    /// Drop entries whose cursor has no holder left and cancel their tasks
    pub fn prune(&mut self) -> usize {
        let before = self.cursors.len();
        self.cursors.retain(|_, entry| {
            if entry.cursor.strong_count() > 0 {
                return true;
            }
            entry.retire_task();
            false
        });
        let pruned = before - self.cursors.len();
        if pruned > 0 {
            tracing::debug!(pruned, "released dropped cursors");
        }
        pruned
    }

    /// Number of cursors still alive
    pub fn len(&self) -> usize {
        self.cursors
            .values()
            .filter(|entry| entry.cursor.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stop_all(&mut self) {
        for (_, entry) in self.cursors.iter_mut() {
            if let Some(cursor) = entry.live() {
                cursor.stop();
            }
            entry.retire_task();
        }
    }
}

impl Drop for CursorArena {
    fn drop(&mut self) {
        self.stop_all();
    }
}

impl std::fmt::Debug for CursorArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorArena")
            .field("cursors", &self.len())
            .finish()
    }
}
