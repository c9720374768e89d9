use std::time::{Duration, Instant};

/// Rate limiter for scroll re-evaluation.
///
/// A call that arrives inside the interval is remembered and can be flushed
/// later with [`Throttle::flush_due`], so the last scroll position is always
/// evaluated eventually.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_fired: Option<Instant>,
    pending: bool,
}

impl Throttle {
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
            pending: false,
        }
    }

    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    /// Returns true if the caller may run now. Otherwise a trailing run is recorded.
    pub fn try_fire(&mut self, now: Instant) -> bool {
        if self.is_open(now) {
            self.last_fired = Some(now);
            self.pending = false;
            true
        } else {
            self.pending = true;
            false
        }
    }

    /// Returns true if a trailing run was recorded and the interval has passed.
    pub fn flush_due(&mut self, now: Instant) -> bool {
        if self.pending && self.is_open(now) {
            self.last_fired = Some(now);
            self.pending = false;
            true
        } else {
            false
        }
    }

    fn is_open(&self, now: Instant) -> bool {
        self.last_fired
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }
}
