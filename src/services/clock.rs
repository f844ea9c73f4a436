use chrono::{DateTime, Utc};

/// Time source seam so the watcher and engines can be driven with a manual
/// clock in tests instead of a real timer.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
