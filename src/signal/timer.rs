//! Capture Counter Timing
//!
//! The pulse input is timed by a free-running 8-bit counter behind a clock
//! divider. The divider is chosen so that one counter period is longer than
//! the longest valid pulse, which keeps a valid pulse from wrapping the
//! counter more than once.

use super::ConfigError;
use crate::types::CaptureTimestamp;

/// Clock divider in front of the capture counter
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Prescaler {
    /// No division
    Div1,
    /// Divide by 8
    Div8,
    /// Divide by 64
    Div64,
    /// Divide by 256
    Div256,
    /// Divide by 1024
    Div1024,
}

impl Prescaler {
    /// All dividers, finest first
    pub const ALL: [Self; 5] = [Self::Div1, Self::Div8, Self::Div64, Self::Div256, Self::Div1024];

    /// Division factor
    #[must_use]
    pub const fn divisor(self) -> u32 {
        match self {
            Self::Div1 => 1,
            Self::Div8 => 8,
            Self::Div64 => 64,
            Self::Div256 => 256,
            Self::Div1024 => 1024,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Prescaler {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "/{}", self.divisor());
    }
}

/// Capture counter clock configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerConfig {
    /// Counter input clock before the prescaler
    clock_hz: u32,
    /// Selected divider
    prescaler: Prescaler,
}

impl TimerConfig {
    /// Create from an input clock and divider
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroClock`] for a 0 Hz clock.
    pub const fn new(clock_hz: u32, prescaler: Prescaler) -> Result<Self, ConfigError> {
        if clock_hz == 0 {
            return Err(ConfigError::ZeroClock);
        }
        Ok(Self {
            clock_hz,
            prescaler,
        })
    }

    /// Pick the finest divider whose counter period is strictly longer
    /// than `min_period_us`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroClock`] for a 0 Hz clock and
    /// [`ConfigError::PeriodUnreachable`] if even the coarsest divider is
    /// too fast.
    pub fn select(clock_hz: u32, min_period_us: u32) -> Result<Self, ConfigError> {
        if clock_hz == 0 {
            return Err(ConfigError::ZeroClock);
        }

        // period_us > min  <=>  256 * div * 1e6 > min * clock
        let required = u64::from(min_period_us) * u64::from(clock_hz);
        Prescaler::ALL
            .into_iter()
            .find(|p| {
                u64::from(CaptureTimestamp::PERIOD_TICKS) * u64::from(p.divisor()) * 1_000_000
                    > required
            })
            .map(|prescaler| Self {
                clock_hz,
                prescaler,
            })
            .ok_or(ConfigError::PeriodUnreachable)
    }

    /// Counter input clock in Hz
    #[must_use]
    pub const fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    /// Selected divider
    #[must_use]
    pub const fn prescaler(&self) -> Prescaler {
        self.prescaler
    }

    /// Counter tick rate in Hz (truncated)
    #[must_use]
    pub const fn tick_hz(&self) -> u32 {
        self.clock_hz / self.prescaler.divisor()
    }

    /// Duration of one tick in nanoseconds (truncated)
    #[must_use]
    pub const fn tick_ns(&self) -> u64 {
        self.prescaler.divisor() as u64 * 1_000_000_000 / self.clock_hz as u64
    }

    /// Duration of one full counter period in microseconds (truncated)
    #[must_use]
    pub const fn period_us(&self) -> u32 {
        self.ticks_to_us(CaptureTimestamp::PERIOD_TICKS as u32)
    }

    /// Convert counter ticks to microseconds (truncated)
    #[must_use]
    pub const fn ticks_to_us(&self, ticks: u32) -> u32 {
        let us = ticks as u64 * self.prescaler.divisor() as u64 * 1_000_000 / self.clock_hz as u64;
        if us > u32::MAX as u64 {
            u32::MAX
        } else {
            us as u32
        }
    }

    /// Convert microseconds to counter ticks (truncated)
    #[must_use]
    pub const fn us_to_ticks(&self, us: u32) -> u32 {
        let ticks = us as u64 * self.clock_hz as u64 / (self.prescaler.divisor() as u64 * 1_000_000);
        if ticks > u32::MAX as u64 {
            u32::MAX
        } else {
            ticks as u32
        }
    }

    /// Counter value at `elapsed_us` since the counter started
    #[must_use]
    pub const fn sample_at(&self, elapsed_us: u64) -> CaptureTimestamp {
        let ticks = elapsed_us * self.clock_hz as u64 / (self.prescaler.divisor() as u64 * 1_000_000);
        CaptureTimestamp::from_raw((ticks % CaptureTimestamp::PERIOD_TICKS as u64) as u8)
    }

    /// Time of the first counter wrap strictly after `elapsed_us`, in
    /// microseconds since the counter started
    #[must_use]
    pub const fn next_wrap_us(&self, elapsed_us: u64) -> u64 {
        let us_per_tick_scaled = self.prescaler.divisor() as u64 * 1_000_000;
        let period = CaptureTimestamp::PERIOD_TICKS as u64;
        let ticks = elapsed_us * self.clock_hz as u64 / us_per_tick_scaled;
        let wrap_ticks = (ticks / period + 1) * period;
        (wrap_ticks * us_per_tick_scaled).div_ceil(self.clock_hz as u64)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TimerConfig {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Capture({}Hz {}, period {}us)",
            self.clock_hz,
            self.prescaler,
            self.period_us()
        );
    }
}
