use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

/// Monotonic time source, in seconds since an arbitrary origin.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;

    fn now_ms(&self) -> f64 {
        self.now() * 1000.0
    }
}

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
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock that only moves when told to. Cloning shares the same time.
#[derive(Clone, Default)]
pub struct ManualClock {
    seconds: Arc<Mutex<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, seconds: f64) {
        *self.seconds.lock() = seconds;
    }

    pub fn advance(&self, seconds: f64) {
        *self.seconds.lock() += seconds;
    }

    pub fn advance_ms(&self, ms: f64) {
        self.advance(ms / 1000.0);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.seconds.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new();
        let other = clock.clone();

        clock.advance(1.5);
        other.advance_ms(500.0);

        assert_eq!(clock.now(), 2.0);
        assert_eq!(other.now_ms(), 2000.0);
    }

    #[test]
    fn system_clock_does_not_go_backwards() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
