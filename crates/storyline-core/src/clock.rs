//! Time abstraction
//!
//! Playback timing is measured on a monotonic clock while story expiry is
//! measured in wall-clock UTC. [`Clock`] provides both so tests can drive
//! either one deterministically with a [`ManualClock`].

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Time abstraction for testability
pub trait Clock: Send + Sync {
    /// Get the current instant (monotonic time)
    fn now(&self) -> Instant;

    /// Get the current UTC datetime
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Real clock implementation using system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug)]
struct ManualState {
    instant: Instant,
    utc: DateTime<Utc>,
}

/// Clock that only moves when told to
///
/// Clones share the same underlying time, so a test can hand one clone to
/// the code under test and advance the other.
#[derive(Debug, Clone)]
pub struct ManualClock {
    state: Arc<Mutex<ManualState>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Create a manual clock starting at the current system time
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Create a manual clock whose wall-clock reading starts at `utc`
    pub fn starting_at(utc: DateTime<Utc>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                instant: Instant::now(),
                utc,
            })),
        }
    }

    /// Move both the monotonic and the wall-clock reading forward
    pub fn advance(&self, by: Duration) {
        let mut state = self.lock();
        state.instant += by;
        state.utc += chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
    }

    /// Jump the wall-clock reading without touching monotonic time
    pub fn set_utc(&self, utc: DateTime<Utc>) {
        self.lock().utc = utc;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        // A poisoned clock still holds a valid reading.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.lock().instant
    }

    fn now_utc(&self) -> DateTime<Utc> {
        self.lock().utc
    }
}
