//! Launch-rate limiting for external steps.
//!
//! Every step process, from every deployment, takes a launch permit from a
//! single [`LaunchLimiter`] before it starts. A permit is released a fixed
//! spacing after it was granted, no matter how long the step runs, so
//! launches hitting the cloud control plane are at least `spacing` apart
//! while already-running steps proceed independently.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Minimum gap between two step launches.
pub const DEFAULT_LAUNCH_SPACING: Duration = Duration::from_secs(2);

/// A monotonic time source that can also block.
///
/// Times are offsets from an arbitrary per-clock origin.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> Duration;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Wall-clock time backed by [`Instant`].
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A clock that only moves when slept on. Sleeping advances it instantly.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward without sleeping.
    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Process-wide launch permit with delayed release.
///
/// The limiter keeps the instant at which the current permit is released.
/// [`acquire`](Self::acquire) waits for that instant while holding the
/// limiter's lock, so concurrent callers are granted permits one at a time,
/// then schedules the next release at `granted + spacing`.
pub struct LaunchLimiter {
    spacing: Duration,
    clock: Box<dyn Clock>,
    release_at: Mutex<Option<Duration>>,
}

impl LaunchLimiter {
    /// A limiter on the system clock.
    pub fn new(spacing: Duration) -> Self {
        Self::with_clock(spacing, Box::new(SystemClock::new()))
    }

    /// A limiter on a caller-supplied clock.
    pub fn with_clock(spacing: Duration, clock: Box<dyn Clock>) -> Self {
        Self {
            spacing,
            clock,
            release_at: Mutex::new(None),
        }
    }

    /// The configured spacing.
    pub fn spacing(&self) -> Duration {
        self.spacing
    }

    /// Block until a permit is available; returns the time it was granted.
    pub fn acquire(&self) -> Duration {
        let mut release_at = self
            .release_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(at) = *release_at {
            let now = self.clock.now();
            if at > now {
                self.clock.sleep(at - now);
            }
        }

        let granted = self.clock.now();
        *release_at = Some(granted + self.spacing);
        granted
    }
}

impl Default for LaunchLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_LAUNCH_SPACING)
    }
}

impl std::fmt::Debug for LaunchLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchLimiter")
            .field("spacing", &self.spacing)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> (LaunchLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let limiter = LaunchLimiter::with_clock(
            DEFAULT_LAUNCH_SPACING,
            Box::new(Arc::clone(&clock)),
        );
        (limiter, clock)
    }

    #[test]
    fn first_acquire_is_immediate() {
        let (limiter, _) = limiter();
        assert_eq!(limiter.acquire(), Duration::ZERO);
    }

    #[test]
    fn back_to_back_acquires_are_spaced() {
        let (limiter, _) = limiter();
        let a = limiter.acquire();
        let b = limiter.acquire();
        let c = limiter.acquire();
        assert_eq!(b - a, Duration::from_secs(2));
        assert_eq!(c - b, Duration::from_secs(2));
    }

    #[test]
    fn release_is_measured_from_acquisition() {
        let (limiter, clock) = limiter();
        limiter.acquire();
        // A long-running step does not hold the permit beyond the spacing.
        clock.advance(Duration::from_secs(5));
        assert_eq!(limiter.acquire(), Duration::from_secs(5));
    }

    #[test]
    fn partial_wait_only_covers_remaining_spacing() {
        let (limiter, clock) = limiter();
        limiter.acquire();
        clock.advance(Duration::from_millis(1500));
        assert_eq!(limiter.acquire(), Duration::from_secs(2));
    }

    #[test]
    fn concurrent_acquires_never_closer_than_spacing() {
        let (limiter, _) = limiter();
        let limiter = Arc::new(limiter);

        let mut stamps: Vec<Duration> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let limiter = Arc::clone(&limiter);
                    s.spawn(move || (0..5).map(|_| limiter.acquire()).collect::<Vec<_>>())
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        stamps.sort();
        assert_eq!(stamps.len(), 40);
        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(2), "{pair:?}");
        }
    }

    #[test]
    fn system_clock_waits_for_real() {
        let limiter = LaunchLimiter::new(Duration::from_millis(50));
        let start = Instant::now();
        limiter.acquire();
        limiter.acquire();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
