//! Per-story countdown
//!
//! The timer is driven entirely by instants handed in by the caller, so it
//! works the same under a real clock, a manual clock, or an async driver
//! that sleeps until [`StoryTimer::deadline`].
//!
//! Every restart or cancel bumps a generation counter. A scheduled wake-up
//! carries the [`TimerToken`] it was armed with and is ignored once the
//! token is stale, so a timer armed for a previous story can never advance
//! the current one.

use std::time::{Duration, Instant};

/// Identifies one arming of the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// Pausable countdown for the story on screen
#[derive(Debug, Clone)]
pub struct StoryTimer {
    duration: Duration,
    /// Time accumulated before the current running stretch
    banked: Duration,
    /// Start of the current running stretch, `None` while paused or stopped
    running_since: Option<Instant>,
    armed: bool,
    generation: u64,
}

impl StoryTimer {
    /// Create a stopped timer
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            banked: Duration::ZERO,
            running_since: None,
            armed: false,
            generation: 0,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Start counting from zero
    pub fn restart(&mut self, now: Instant) -> TimerToken {
        self.rearm(Some(now))
    }

    /// Reset to zero without starting (cursor moved while paused)
    pub fn restart_paused(&mut self) -> TimerToken {
        self.rearm(None)
    }

    /// Stop and disarm; any outstanding token becomes stale
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.banked = Duration::ZERO;
        self.running_since = None;
        self.armed = false;
    }

    /// Freeze elapsed time
    pub fn pause(&mut self, now: Instant) {
        if let Some(since) = self.running_since.take() {
            self.banked += now.saturating_duration_since(since);
        }
    }

    /// Continue from the frozen elapsed time
    pub fn resume(&mut self, now: Instant) {
        if self.armed && self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Time shown so far, capped at the story duration
    pub fn elapsed(&self, now: Instant) -> Duration {
        let running = self
            .running_since
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or(Duration::ZERO);
        (self.banked + running).min(self.duration)
    }

    /// Progress in `[0, 1]`
    pub fn fraction(&self, now: Instant) -> f32 {
        if !self.armed {
            return 0.0;
        }
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed(now).as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0) as f32
    }

    /// Whether the armed countdown has run out
    pub fn is_expired(&self, now: Instant) -> bool {
        self.armed && self.elapsed(now) >= self.duration
    }

    /// Instant the countdown runs out, if it is running
    pub fn deadline(&self) -> Option<Instant> {
        let since = self.running_since?;
        if !self.armed {
            return None;
        }
        Some(since + self.duration.saturating_sub(self.banked))
    }

    /// Token of the current arming, if armed
    pub fn token(&self) -> Option<TimerToken> {
        self.armed.then_some(TimerToken(self.generation))
    }

    /// Whether `token` belongs to the current arming
    pub fn is_current(&self, token: TimerToken) -> bool {
        self.armed && token.0 == self.generation
    }

    fn rearm(&mut self, running_since: Option<Instant>) -> TimerToken {
        self.generation += 1;
        self.banked = Duration::ZERO;
        self.running_since = running_since;
        self.armed = true;
        TimerToken(self.generation)
    }
}
