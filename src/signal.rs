//! Pulse Input
//!
//! Pulse-width measurement and signal-loss detection on top of a
//! free-running capture counter, plus decoding of servo pulses into
//! duty requests.

use core::fmt;

pub mod servo;
pub mod shared;
pub mod timer;
pub mod watchdog;

/// Invalid pulse-input configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Counter clock of 0 Hz
    ZeroClock,
    /// No prescaler yields a counter period above the requested minimum
    PeriodUnreachable,
    /// Loss timeout does not exceed the longest valid pulse
    TimeoutTooShort,
    /// Loss timeout does not fit in 16-bit ticks
    TimeoutTooLong,
    /// Servo half span of zero
    ZeroSpan,
    /// Servo center outside the valid pulse envelope
    CenterOutsideEnvelope,
    /// Servo deadband reaches the full span
    DeadbandTooWide,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::ZeroClock => "capture clock is 0 Hz",
            Self::PeriodUnreachable => "no prescaler reaches the minimum counter period",
            Self::TimeoutTooShort => "loss timeout must exceed the longest valid pulse",
            Self::TimeoutTooLong => "loss timeout overflows the tick range",
            Self::ZeroSpan => "servo half span is zero",
            Self::CenterOutsideEnvelope => "servo center lies outside the valid envelope",
            Self::DeadbandTooWide => "servo deadband covers the whole span",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ConfigError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::ZeroClock => defmt::write!(f, "ZeroClock"),
            Self::PeriodUnreachable => defmt::write!(f, "PeriodUnreachable"),
            Self::TimeoutTooShort => defmt::write!(f, "TimeoutTooShort"),
            Self::TimeoutTooLong => defmt::write!(f, "TimeoutTooLong"),
            Self::ZeroSpan => defmt::write!(f, "ZeroSpan"),
            Self::CenterOutsideEnvelope => defmt::write!(f, "CenterOutsideEnvelope"),
            Self::DeadbandTooWide => defmt::write!(f, "DeadbandTooWide"),
        }
    }
}
