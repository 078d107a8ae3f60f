//! Pausable playback clock
//!
//! The clock accumulates wall-clock time only while running. It is sampled
//! once per frame, so variable frame timing never drifts the playback
//! position.

use std::fmt;
use std::time::{Duration, Instant};

/// Monotonic time source, measured from an arbitrary origin.
pub trait TimeSource: Send {
    fn now(&self) -> Duration;
}

/// [`TimeSource`] backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Elapsed-time accumulator with start/stop/restart.
pub struct Clock {
    source: Box<dyn TimeSource>,
    /// Time accumulated over previous running spans
    accumulated: Duration,
    /// Source time when the current running span began
    started_at: Option<Duration>,
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clock")
            .field("elapsed", &self.elapsed())
            .field("running", &self.is_running())
            .finish()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    /// Create a stopped clock reading wall-clock time
    pub fn new() -> Self {
        Self::with_source(Box::new(SystemTimeSource::default()))
    }

    /// Create a stopped clock reading from `source`
    pub fn with_source(source: Box<dyn TimeSource>) -> Self {
        Self {
            source,
            accumulated: Duration::ZERO,
            started_at: None,
        }
    }

    /// Resume accumulating. No effect if already running.
    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(self.source.now());
        }
    }

    /// Stop accumulating, keeping the elapsed time.
    pub fn stop(&mut self) {
        if let Some(started) = self.started_at.take() {
            self.accumulated += self.source.now().saturating_sub(started);
        }
    }

    /// Reset elapsed time to zero and start running.
    pub fn restart(&mut self) {
        self.accumulated = Duration::ZERO;
        self.started_at = Some(self.source.now());
    }

    /// Jump to `elapsed`, keeping the running state.
    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.accumulated = elapsed;
        if self.started_at.is_some() {
            self.started_at = Some(self.source.now());
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started) => self.accumulated + self.source.now().saturating_sub(started),
            None => self.accumulated,
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }
}
