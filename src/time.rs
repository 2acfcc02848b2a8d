//! Time source abstraction
//!
//! Every age check in the auth flow (challenge expiry, reuse window, token
//! expiry) reads the clock through [`TimeSource`] so tests can pin it.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Abstracts the system clock
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests
#[derive(Debug)]
pub struct TimeSourceStub {
    t: Mutex<DateTime<Utc>>,
}

impl TimeSourceStub {
    pub fn new() -> Self {
        Self::new_set(Utc::now())
    }

    pub fn new_set(t: DateTime<Utc>) -> Self {
        Self { t: Mutex::new(t) }
    }

    pub fn set(&self, t: DateTime<Utc>) {
        *self.t.lock().unwrap_or_else(|e| e.into_inner()) = t;
    }

    pub fn advance(&self, by: Duration) {
        let mut t = self.t.lock().unwrap_or_else(|e| e.into_inner());
        *t += by;
    }
}

impl Default for TimeSourceStub {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for TimeSourceStub {
    fn now(&self) -> DateTime<Utc> {
        *self.t.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_advance() {
        let start = Utc::now();
        let clock = TimeSourceStub::new_set(start);

        clock.advance(Duration::seconds(61));

        assert_eq!(clock.now(), start + Duration::seconds(61));
        assert_eq!(clock.now_ms(), start.timestamp_millis() + 61_000);
    }

    #[test]
    fn test_stub_set() {
        let clock = TimeSourceStub::new();
        let target = Utc::now() - Duration::days(3);
        clock.set(target);
        assert_eq!(clock.now(), target);
    }
}
