use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

/// Source of "now" for relative timestamps, swappable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

#[cfg(test)]
pub fn fixed_clock(timestamp: i64) -> Arc<dyn Clock> {
    let now = Utc
        .timestamp_opt(timestamp, 0)
        .single()
        .unwrap_or_default();
    Arc::new(FixedClock(now))
}

pub fn now_unix() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Short relative age like "5m ago". Future timestamps read as "just now".
pub fn format_relative(timestamp: u64, now: DateTime<Utc>) -> String {
    let then = Utc
        .timestamp_opt(timestamp as i64, 0)
        .single()
        .unwrap_or_default();
    let secs = (now - then).num_seconds();
    if secs < 60 {
        "just now".to_string()
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86400 {
        format!("{}h ago", secs / 3600)
    } else if secs < 2_592_000 {
        format!("{}d ago", secs / 86400)
    } else {
        format!("{}mo ago", secs / 2_592_000)
    }
}
