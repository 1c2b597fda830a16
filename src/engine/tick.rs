// Fixed-step simulation clock.
// Turns variable frame time into a whole number of fixed ticks so the flight
// path advances at the same rate regardless of the display refresh rate.

use std::time::Duration;

pub struct FixedTicker {
    /// Length of one simulation tick.
    pub interval: Duration,
    /// Upper bound on ticks run in a single frame. Any backlog beyond it is dropped.
    pub max_ticks_per_frame: u32,
    accumulator: Duration,
}

impl FixedTicker {
    pub fn new() -> Self {
        Self {
            interval: Duration::from_millis(10),
            max_ticks_per_frame: 5,
            accumulator: Duration::ZERO,
        }
    }

    /// Add one frame's elapsed time and return how many ticks to run now.
    pub fn accumulate(&mut self, elapsed: Duration) -> u32 {
        if self.interval.is_zero() {
            return 0;
        }
        self.accumulator += elapsed;

        let mut ticks = 0;
        while self.accumulator >= self.interval {
            if ticks == self.max_ticks_per_frame {
                // Long stall (window drag, breakpoint): don't try to catch up.
                self.accumulator = Duration::ZERO;
                break;
            }
            self.accumulator -= self.interval;
            ticks += 1;
        }
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_remainder_between_frames() {
        let mut ticker = FixedTicker::new();
        assert_eq!(ticker.accumulate(Duration::from_millis(25)), 2);
        assert_eq!(ticker.accumulate(Duration::from_millis(5)), 1);
        assert_eq!(ticker.accumulate(Duration::from_millis(9)), 0);
    }

    #[test]
    fn short_frames_accumulate() {
        let mut ticker = FixedTicker::new();
        assert_eq!(ticker.accumulate(Duration::from_millis(4)), 0);
        assert_eq!(ticker.accumulate(Duration::from_millis(4)), 0);
        assert_eq!(ticker.accumulate(Duration::from_millis(4)), 1);
        assert_eq!(ticker.accumulate(Duration::from_millis(8)), 1);
    }

    #[test]
    fn stall_is_capped_and_backlog_dropped() {
        let mut ticker = FixedTicker::new();
        assert_eq!(ticker.accumulate(Duration::from_secs(1)), 5);
        // Nothing carried over from the stall.
        assert_eq!(ticker.accumulate(Duration::from_millis(9)), 0);
        assert_eq!(ticker.accumulate(Duration::from_millis(1)), 1);
    }

    #[test]
    fn zero_interval_never_ticks() {
        let mut ticker = FixedTicker::new();
        ticker.interval = Duration::ZERO;
        assert_eq!(ticker.accumulate(Duration::from_millis(50)), 0);
    }
}
