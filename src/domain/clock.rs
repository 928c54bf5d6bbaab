use chrono::Utc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimestampMs(pub i64);

impl TimestampMs {
    pub fn as_unix_seconds(self) -> i64 {
        self.0.div_euclid(1000)
    }
}

pub trait Clock {
    fn now(&self) -> TimestampMs;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimestampMs {
        TimestampMs(Utc::now().timestamp_millis())
    }
}

/// Clock pinned to a single instant, used wherever a deterministic signature
/// or storage timestamp is needed.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub TimestampMs);

impl Clock for FixedClock {
    fn now(&self) -> TimestampMs {
        self.0
    }
}
