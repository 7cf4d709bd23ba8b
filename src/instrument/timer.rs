//! Monotonic call timing.

use std::time::{Duration, Instant};

/// Starts single-shot measurements on the monotonic clock.
pub struct CallTimer;

impl CallTimer {
    pub fn start() -> TimerHandle {
        TimerHandle {
            started_at: Instant::now(),
        }
    }
}

/// A running measurement. Reading it consumes the handle.
#[derive(Debug)]
pub struct TimerHandle {
    started_at: Instant,
}

impl TimerHandle {
    pub fn elapsed(self) -> Duration {
        self.started_at.elapsed()
    }

    /// Elapsed whole milliseconds, saturating at `u64::MAX`.
    pub fn elapsed_millis(self) -> u64 {
        u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_covers_sleep() {
        let handle = CallTimer::start();
        std::thread::sleep(Duration::from_millis(15));
        assert!(handle.elapsed_millis() >= 15);
    }

    #[test]
    fn test_immediate_read_is_small() {
        let handle = CallTimer::start();
        assert!(handle.elapsed() < Duration::from_secs(1));
    }
}
