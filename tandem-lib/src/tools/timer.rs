//! Media clock driven by virtual time.

use std::time::Duration;

/// Tracks media time for a simulated stream.
///
/// The clock only moves when [`advance`](Timer::advance) is called, scaled by
/// the current rate, so a whole session can be stepped deterministically.
#[derive(Debug, Clone)]
pub struct Timer {
    time: Duration,
    running: bool,
    rate: f64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Self {
        Self {
            time: Duration::ZERO,
            running: false,
            rate: 1.0,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn start_at(&mut self, time: Duration) {
        self.time = time;
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Jump to `time` without changing the running state.
    pub fn set_time(&mut self, time: Duration) {
        self.time = time;
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Non-positive or non-finite rates are ignored.
    pub fn set_rate(&mut self, rate: f64) {
        if rate.is_finite() && rate > 0.0 {
            self.rate = rate;
        }
    }

    /// Move the clock forward by `elapsed` wall time. Returns the media time gained.
    pub fn advance(&mut self, elapsed: Duration) -> Duration {
        if !self.running {
            return Duration::ZERO;
        }
        let gained = elapsed.mul_f64(self.rate);
        self.time += gained;
        gained
    }

    pub fn get_time(&self) -> Duration {
        self.time
    }
}
