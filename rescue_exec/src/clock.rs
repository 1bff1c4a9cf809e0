//! # Clocks
//!
//! Every timeout in the control core is judged against a [`Clock`] rather than the system time
//! directly, so that tests and simulations can drive the core with virtual time.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of time.
pub trait Clock: Send + Sync {
    /// Current time in seconds. Only differences between two readings are meaningful.
    fn now_s(&self) -> f64;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Wall clock, counting seconds since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

/// Virtual clock which only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and advance it while the scheduler
/// and the telemetry port read the other.
#[derive(Debug, Clone)]
pub struct SimClock {
    time_s_bits: Arc<AtomicU64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_s(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl SimClock {
    /// Create a new virtual clock starting at `start_s`.
    pub fn new(start_s: f64) -> Self {
        Self {
            time_s_bits: Arc::new(AtomicU64::new(start_s.to_bits())),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, time_s: f64) {
        self.time_s_bits.store(time_s.to_bits(), Ordering::SeqCst);
    }

    /// Move the clock forward by `dt_s` seconds.
    pub fn advance(&self, dt_s: f64) {
        // Only one thread ever advances the virtual clock, load-then-store is enough
        self.set(self.now_s() + dt_s);
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Clock for SimClock {
    fn now_s(&self) -> f64 {
        f64::from_bits(self.time_s_bits.load(Ordering::SeqCst))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_clock_is_shared() {
        let clock = SimClock::new(10.0);
        let other = clock.clone();

        clock.advance(0.25);
        assert!((other.now_s() - 10.25).abs() < 1e-12);

        other.set(3.0);
        assert_eq!(clock.now_s(), 3.0);
    }

    #[test]
    fn test_monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now_s();
        let b = clock.now_s();
        assert!(b >= a);
        assert!(a >= 0.0);
    }
}
