//! Frame pacing
//!
//! OS sleeps routinely overshoot. Instead of one sleep for the whole gap, the
//! pacer sleeps for a fraction of whatever remains until the deadline passes,
//! so a late wake-up only ever costs a fraction of the last short sleep.

use std::time::{Duration, Instant};

use crate::scheduler::CancellationToken;

/// Share of the remaining gap slept on each iteration
pub const SLEEP_FRACTION: f64 = 0.8;

/// Source of time and sleeping for the pacer
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `std::thread::sleep`
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Result of one wait
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaceReport {
    /// Number of sleeps issued
    pub sleeps: u32,
    /// How far past the deadline the wait finished
    pub overshoot: Duration,
    /// The wait ended early because the token was cancelled
    pub cancelled: bool,
}

/// One step of a converging wait
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaceStep {
    /// Sleep this long, then take another step
    Sleep(Duration),
    /// The deadline has passed, by this much
    Reached(Duration),
    Cancelled,
}

/// Decide the next step of a wait for `deadline` observed at `now`.
///
/// Shared by every scheduler so they all pace ticks the same way.
pub fn pace_step(now: Instant, deadline: Instant, cancel: &CancellationToken) -> PaceStep {
    if cancel.is_cancelled() {
        PaceStep::Cancelled
    } else if now >= deadline {
        PaceStep::Reached(now - deadline)
    } else {
        PaceStep::Sleep((deadline - now).mul_f64(SLEEP_FRACTION))
    }
}

/// Converging deadline waiter
#[derive(Debug, Clone)]
pub struct FramePacer<C: Clock = SystemClock> {
    clock: C,
}

impl FramePacer<SystemClock> {
    pub fn system() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> FramePacer<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Sleep until `deadline`, re-checking `cancel` between sleeps
    pub fn wait_until(&self, deadline: Instant, cancel: &CancellationToken) -> PaceReport {
        let mut sleeps = 0;
        loop {
            match pace_step(self.clock.now(), deadline, cancel) {
                PaceStep::Sleep(duration) => {
                    self.clock.sleep(duration);
                    sleeps += 1;
                }
                PaceStep::Reached(overshoot) => {
                    return PaceReport {
                        sleeps,
                        overshoot,
                        cancelled: false,
                    }
                }
                PaceStep::Cancelled => {
                    return PaceReport {
                        sleeps,
                        overshoot: Duration::ZERO,
                        cancelled: true,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Clock whose sleeps take `factor` times the requested duration plus a
    /// fixed scheduler latency
    struct FakeClock {
        start: Instant,
        elapsed: Cell<Duration>,
        factor: f64,
        latency: Duration,
        requested: RefCell<Vec<Duration>>,
    }

    impl FakeClock {
        fn new(factor: f64, latency: Duration) -> Self {
            Self {
                start: Instant::now(),
                elapsed: Cell::new(Duration::ZERO),
                factor,
                latency,
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.start + self.elapsed.get()
        }

        fn sleep(&self, duration: Duration) {
            self.requested.borrow_mut().push(duration);
            let actual = duration.mul_f64(self.factor) + self.latency;
            self.elapsed.set(self.elapsed.get() + actual);
        }
    }

    #[test]
    fn test_sleeps_eighty_percent_of_remaining() {
        let pacer = FramePacer::new(FakeClock::new(1.0, Duration::from_micros(500)));
        let deadline = pacer.clock().now() + Duration::from_millis(100);
        let report = pacer.wait_until(deadline, &CancellationToken::new());

        let requested = pacer.clock().requested.borrow();
        assert_eq!(requested[0], Duration::from_millis(80));
        // Second sleep covers 80% of what the first left over
        let after_first =
            Duration::from_millis(100) - (Duration::from_millis(80) + Duration::from_micros(500));
        assert_eq!(requested[1], after_first.mul_f64(SLEEP_FRACTION));
        assert!(report.sleeps >= 2);
        assert!(!report.cancelled);
        assert!(report.overshoot <= Duration::from_micros(500));
    }

    #[test]
    fn test_overshooting_clock_still_converges() {
        // Every sleep takes 20% longer than asked
        let pacer = FramePacer::new(FakeClock::new(1.2, Duration::from_micros(50)));
        let deadline = pacer.clock().now() + Duration::from_millis(100);
        let report = pacer.wait_until(deadline, &CancellationToken::new());

        // 0.8 * 1.2 = 0.96 of the gap per sleep, so the final overshoot stays small
        assert!(report.overshoot < Duration::from_millis(5));
        assert!(pacer.clock().now() >= deadline);
    }

    #[test]
    fn test_past_deadline_returns_immediately() {
        let pacer = FramePacer::new(FakeClock::new(1.0, Duration::ZERO));
        let deadline = pacer.clock().now();
        let report = pacer.wait_until(deadline, &CancellationToken::new());
        assert_eq!(report.sleeps, 0);
        assert_eq!(report.overshoot, Duration::ZERO);
    }

    #[test]
    fn test_pace_step_decisions() {
        let now = Instant::now();
        let token = CancellationToken::new();
        assert_eq!(
            pace_step(now, now + Duration::from_millis(50), &token),
            PaceStep::Sleep(Duration::from_millis(50).mul_f64(SLEEP_FRACTION))
        );
        assert_eq!(
            pace_step(now + Duration::from_millis(3), now, &token),
            PaceStep::Reached(Duration::from_millis(3))
        );
        assert_eq!(pace_step(now, now, &token), PaceStep::Reached(Duration::ZERO));

        token.cancel();
        assert_eq!(
            pace_step(now, now + Duration::from_millis(50), &token),
            PaceStep::Cancelled
        );
    }

    #[test]
    fn test_cancelled_token_stops_wait() {
        let pacer = FramePacer::new(FakeClock::new(1.0, Duration::ZERO));
        let token = CancellationToken::new();
        token.cancel();
        let deadline = pacer.clock().now() + Duration::from_secs(10);
        let report = pacer.wait_until(deadline, &token);
        assert!(report.cancelled);
        assert_eq!(report.sleeps, 0);
    }
}
