//! Shared types used across the motor firmware
//!
//! This module defines the values that flow between the pulse input,
//! the duty mapper and the PWM output. They are small `Copy` types so they
//! can be handed across interrupt and task boundaries by value.

use core::fmt;

/// Signed duty-cycle request
///
/// Positive values drive the motor forward, negative values reverse.
/// The conceptual range is `-255..=255`; the value is stored in an `i32`
/// so that out-of-range requests can be recognised before clamping.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DutyRequest(i32);

impl DutyRequest {
    /// Largest magnitude the output stage can express
    pub const LIMIT: i32 = 255;

    /// Motor stopped
    pub const STOP: Self = Self(0);

    /// Full forward
    pub const FULL_FORWARD: Self = Self(Self::LIMIT);

    /// Full reverse
    pub const FULL_REVERSE: Self = Self(-Self::LIMIT);

    /// Create a request from any signed value (not clamped yet)
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Raw value as requested
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Value clamped into `-255..=255`
    #[must_use]
    pub const fn clamped(self) -> i16 {
        if self.0 > Self::LIMIT {
            Self::LIMIT as i16
        } else if self.0 < -Self::LIMIT {
            -Self::LIMIT as i16
        } else {
            self.0 as i16
        }
    }

    /// Check if the request lies outside `-255..=255`
    #[must_use]
    pub const fn is_saturated(self) -> bool {
        self.0 > Self::LIMIT || self.0 < -Self::LIMIT
    }

    /// Check if this request stops the motor
    #[must_use]
    pub const fn is_stop(self) -> bool {
        self.0 == 0
    }
}

impl From<i32> for DutyRequest {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl From<i16> for DutyRequest {
    fn from(value: i16) -> Self {
        Self(i32::from(value))
    }
}

impl fmt::Debug for DutyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DutyRequest({})", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for DutyRequest {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "duty({})", self.0);
    }
}

/// Comparator thresholds for the two complementary PWM outputs
///
/// Both outputs share one counter. A channel at 255 is permanently
/// asserted (non-inverting fast PWM with TOP = 255), so the inactive leg is
/// pinned there and direction is encoded by which channel moves away.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PwmChannelPair {
    /// Channel A threshold (reverse leg)
    pub high: u8,
    /// Channel B threshold (forward leg)
    pub low: u8,
}

impl PwmChannelPair {
    /// Both legs idle
    pub const IDLE: Self = Self {
        high: u8::MAX,
        low: u8::MAX,
    };

    /// Create from raw thresholds
    #[must_use]
    pub const fn new(high: u8, low: u8) -> Self {
        Self { high, low }
    }

    /// Check if both legs are idle
    #[must_use]
    pub const fn is_idle(self) -> bool {
        self.high == u8::MAX && self.low == u8::MAX
    }

    /// Number of channels driven away from 255
    #[must_use]
    pub const fn active_channels(self) -> u8 {
        (self.high != u8::MAX) as u8 + (self.low != u8::MAX) as u8
    }

    /// Swap the two channels (mirror the direction)
    #[must_use]
    pub const fn swapped(self) -> Self {
        Self {
            high: self.low,
            low: self.high,
        }
    }
}

impl Default for PwmChannelPair {
    fn default() -> Self {
        Self::IDLE
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for PwmChannelPair {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "A={} B={}", self.high, self.low);
    }
}

/// Sample of the free-running 8-bit capture counter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct CaptureTimestamp(u8);

impl CaptureTimestamp {
    /// Counter ticks per full period
    pub const PERIOD_TICKS: u16 = 256;

    /// Create from a raw counter value
    #[must_use]
    pub const fn from_raw(ticks: u8) -> Self {
        Self(ticks)
    }

    /// Raw counter value
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Ticks from `earlier` to `self`, modulo the counter width
    #[must_use]
    pub const fn wrapping_since(self, earlier: Self) -> u8 {
        self.0.wrapping_sub(earlier.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for CaptureTimestamp {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "t{}", self.0);
    }
}

/// Transition direction of the monitored input line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Low to high
    Rising,
    /// High to low
    Falling,
}

impl Edge {
    /// Line level held after this edge
    #[must_use]
    pub const fn level_after(self) -> Level {
        match self {
            Self::Rising => Level::High,
            Self::Falling => Level::Low,
        }
    }

    /// The edge that ends the interval this edge starts
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Rising => Self::Falling,
            Self::Falling => Self::Rising,
        }
    }

    /// Edge that leads to the given line level
    #[must_use]
    pub const fn into_level(level: Level) -> Self {
        match level {
            Level::High => Self::Rising,
            Level::Low => Self::Falling,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Edge {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Rising => defmt::write!(f, "RISE"),
            Self::Falling => defmt::write!(f, "FALL"),
        }
    }
}

/// Logic level of the input line during a measured interval
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    /// Line high (servo pulse)
    High,
    /// Line low (gap between pulses)
    Low,
}

#[cfg(feature = "embedded")]
impl defmt::Format for Level {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::High => defmt::write!(f, "HIGH"),
            Self::Low => defmt::write!(f, "LOW"),
        }
    }
}

/// Width of one edge-to-edge interval
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PulseMeasurement {
    /// Elapsed capture ticks between the two edges
    pub ticks: u16,
    /// Line level held during the interval
    pub level: Level,
}

impl PulseMeasurement {
    /// Create a measurement
    #[must_use]
    pub const fn new(ticks: u16, level: Level) -> Self {
        Self { ticks, level }
    }

    /// Check if this is a high (servo) pulse
    #[must_use]
    pub const fn is_high(self) -> bool {
        matches!(self.level, Level::High)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for PulseMeasurement {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} {} ticks", self.level, self.ticks);
    }
}
