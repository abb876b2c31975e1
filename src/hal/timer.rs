//! Capture Counter
//!
//! A free-running 8-bit counter derived from the embassy time base. Edge
//! timestamps and overflow instants both come from here so they agree on
//! where the counter wraps.

use embassy_time::{Duration, Instant};

use crate::signal::timer::TimerConfig;
use crate::types::CaptureTimestamp;

/// Software capture counter
#[derive(Clone, Copy, Debug)]
pub struct CaptureCounter {
    timer: TimerConfig,
    start: Instant,
}

impl CaptureCounter {
    /// Start counting from now
    #[must_use]
    pub fn start(timer: TimerConfig) -> Self {
        Self {
            timer,
            start: Instant::now(),
        }
    }

    /// Counter configuration
    #[must_use]
    pub const fn config(&self) -> TimerConfig {
        self.timer
    }

    /// Sample the counter
    #[must_use]
    pub fn now(&self) -> CaptureTimestamp {
        self.timer.sample_at(self.start.elapsed().as_micros())
    }

    /// Instant of the next counter wrap
    #[must_use]
    pub fn next_wrap(&self) -> Instant {
        let elapsed = self.start.elapsed().as_micros();
        self.start + Duration::from_micros(self.timer.next_wrap_us(elapsed))
    }
}

impl defmt::Format for CaptureCounter {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "CaptureCounter({}, now={})", self.timer, self.now());
    }
}
