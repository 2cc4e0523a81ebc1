//! Periodic tick scheduling
//!
//! A scheduler runs a callback repeatedly, each time after the interval the
//! previous call asked for. Cursors use it to advance frames with per-frame
//! delays. The callback owns its state and runs off the rendering thread.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::pacing::FramePacer;
#[cfg(feature = "tokio")]
use crate::pacing::{pace_step, PaceStep};

/// What the scheduler should do after a callback returns
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickControl {
    /// Call again after this interval
    Continue(Duration),
    /// Retire the task
    Stop,
}

pub type TickCallback = Box<dyn FnMut() -> TickControl + Send + 'static>;

/// Shared stop flag for a scheduled task
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Something that can run periodic callbacks
pub trait TickScheduler: Send + Sync {
    /// Run `callback` first after `first_interval`, then after whatever interval
    /// each call returns. Cancelling the token retires the task; the callback is
    /// never invoked after cancellation has been observed.
    fn register_periodic(&self, first_interval: Duration, callback: TickCallback)
        -> CancellationToken;
}

/// Next deadline after `previous`, without piling up missed ticks
fn next_deadline(previous: Instant, interval: Duration) -> Instant {
    let next = previous + interval;
    let now = Instant::now();
    if next < now {
        now
    } else {
        next
    }
}

/// One named OS thread per registered task
#[derive(Debug, Clone)]
pub struct ThreadScheduler {
    name: String,
}

impl ThreadScheduler {
    pub fn new() -> Self {
        Self::with_name("easel-tick")
    }

    /// Threads are named `<name>-<n>`
    pub fn with_name(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

static THREAD_COUNTER: AtomicUsize = AtomicUsize::new(0);

impl TickScheduler for ThreadScheduler {
    fn register_periodic(
        &self,
        first_interval: Duration,
        mut callback: TickCallback,
    ) -> CancellationToken {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let n = THREAD_COUNTER.fetch_add(1, Ordering::Relaxed);
        let thread_name = format!("{}-{}", self.name, n);

        let spawned = std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let pacer = FramePacer::system();
                let mut deadline = Instant::now() + first_interval;
                loop {
                    if pacer.wait_until(deadline, &task_token).cancelled {
                        break;
                    }
                    match callback() {
                        TickControl::Continue(interval) => {
                            deadline = next_deadline(deadline, interval);
                        }
                        TickControl::Stop => break,
                    }
                }
                tracing::trace!("tick thread exiting");
            });

        if let Err(e) = spawned {
            tracing::warn!("Failed to spawn tick thread {}: {}", thread_name, e);
            token.cancel();
        }
        token
    }
}

/// Tasks on a tokio runtime, paced with `tokio::time::sleep`
#[cfg(feature = "tokio")]
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "tokio")]
impl TokioScheduler {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Scheduler on the runtime the caller is running in, if any
    pub fn current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }
}

/// Async counterpart of [`FramePacer::wait_until`]; `false` when cancelled
#[cfg(feature = "tokio")]
async fn paced_sleep_until(deadline: Instant, cancel: &CancellationToken) -> bool {
    loop {
        match pace_step(Instant::now(), deadline, cancel) {
            PaceStep::Sleep(duration) => tokio::time::sleep(duration).await,
            PaceStep::Reached(_) => return true,
            PaceStep::Cancelled => return false,
        }
    }
}

#[cfg(feature = "tokio")]
impl TickScheduler for TokioScheduler {
    fn register_periodic(
        &self,
        first_interval: Duration,
        mut callback: TickCallback,
    ) -> CancellationToken {
        let token = CancellationToken::new();
        let task_token = token.clone();
        self.handle.spawn(async move {
            let mut deadline = Instant::now() + first_interval;
            while paced_sleep_until(deadline, &task_token).await {
                match callback() {
                    TickControl::Continue(interval) => {
                        deadline = next_deadline(deadline, interval);
                    }
                    TickControl::Stop => break,
                }
            }
        });
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::mpsc;

    #[test]
    fn test_token_clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_thread_scheduler_stops_on_request() {
        let scheduler = ThreadScheduler::with_name("test-stop");
        let (tx, rx) = mpsc::channel();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        scheduler.register_periodic(
            Duration::from_millis(5),
            Box::new(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n == 3 {
                    let _ = tx.send(());
                    TickControl::Stop
                } else {
                    TickControl::Continue(Duration::from_millis(5))
                }
            }),
        );

        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_cancel_before_first_tick() {
        let scheduler = ThreadScheduler::new();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let token = scheduler.register_periodic(
            Duration::from_millis(200),
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                TickControl::Continue(Duration::from_millis(200))
            }),
        );
        token.cancel();
        std::thread::sleep(Duration::from_millis(400));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_next_deadline_skips_missed_ticks() {
        let long_ago = Instant::now() - Duration::from_secs(5);
        let next = next_deadline(long_ago, Duration::from_millis(10));
        assert!(next > long_ago + Duration::from_secs(4));
    }
}
