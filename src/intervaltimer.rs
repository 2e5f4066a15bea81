use std::time::{Duration, Instant};

/// Deadline-based periodic timer for a single-threaded event loop. The loop
/// sleeps for `time_until_next` and then calls `poll` with the current time.
pub struct IntervalTimer {
    name: String,
    interval: Duration,
    next_tick: Instant,
    ticks: u64,
}

impl IntervalTimer {
    pub fn new(name: &str, interval: Duration, now: Instant) -> IntervalTimer {
        IntervalTimer {
            name: name.to_string(),
            interval,
            next_tick: now + interval,
            ticks: 0,
        }
    }

    /// Returns true once per elapsed interval. When the loop fell behind by
    /// a whole interval or more, the missed ticks are dropped and the timer
    /// restarts from `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_tick {
            return false;
        }

        self.next_tick = if now >= self.next_tick + self.interval {
            log::debug!("{} timer skipped a tick", self.name);
            now + self.interval
        } else {
            self.next_tick + self.interval
        };
        self.ticks += 1;

        true
    }

    pub fn time_until_next(&self, now: Instant) -> Duration {
        self.next_tick.saturating_duration_since(now)
    }

    /// Takes effect from the next scheduled tick on.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn reset(&mut self, now: Instant) {
        self.next_tick = now + self.interval;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
