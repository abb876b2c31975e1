//! Servo Pulse Decoding
//!
//! Converts the width of a servo-style high pulse into a signed duty
//! request. Center width stops the motor; center plus or minus the half
//! span commands full duty in either direction.

use core::ops::RangeInclusive;

use heapless::HistoryBuffer;

use super::timer::TimerConfig;
use super::ConfigError;
use crate::types::DutyRequest;

/// Pulse-width to duty calibration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServoDecoder {
    center_us: u32,
    half_span_us: u32,
    deadband_us: u32,
    min_valid_us: u32,
    max_valid_us: u32,
}

impl ServoDecoder {
    /// Create a decoder
    ///
    /// `envelope` bounds the pulse widths accepted as commands.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroSpan`], [`ConfigError::DeadbandTooWide`]
    /// or [`ConfigError::CenterOutsideEnvelope`] for inconsistent values.
    pub fn new(
        center_us: u32,
        half_span_us: u32,
        deadband_us: u32,
        envelope: RangeInclusive<u32>,
    ) -> Result<Self, ConfigError> {
        if half_span_us == 0 {
            return Err(ConfigError::ZeroSpan);
        }
        if deadband_us >= half_span_us {
            return Err(ConfigError::DeadbandTooWide);
        }
        if !envelope.contains(&center_us) {
            return Err(ConfigError::CenterOutsideEnvelope);
        }

        Ok(Self {
            center_us,
            half_span_us,
            deadband_us,
            min_valid_us: *envelope.start(),
            max_valid_us: *envelope.end(),
        })
    }

    /// Pulse width that stops the motor
    #[must_use]
    pub const fn center_us(&self) -> u32 {
        self.center_us
    }

    /// Accepted pulse widths
    #[must_use]
    pub const fn envelope(&self) -> RangeInclusive<u32> {
        self.min_valid_us..=self.max_valid_us
    }

    /// Check if a width is accepted as a command
    #[must_use]
    pub const fn is_valid(&self, width_us: u32) -> bool {
        width_us >= self.min_valid_us && width_us <= self.max_valid_us
    }

    /// Decode a pulse width in microseconds
    ///
    /// Returns `None` for widths outside the envelope. The deadband is
    /// removed before scaling so the output starts from zero at its edge.
    #[must_use]
    pub fn decode(&self, width_us: u32) -> Option<DutyRequest> {
        if !self.is_valid(width_us) {
            return None;
        }

        let offset = i64::from(width_us) - i64::from(self.center_us);
        let magnitude = offset.unsigned_abs();
        let deadband = u64::from(self.deadband_us);
        if magnitude <= deadband {
            return Some(DutyRequest::STOP);
        }

        let span = u64::from(self.half_span_us) - deadband;
        let scaled = ((magnitude - deadband) * DutyRequest::LIMIT as u64 / span)
            .min(DutyRequest::LIMIT as u64) as i32;

        Some(DutyRequest::new(if offset < 0 { -scaled } else { scaled }))
    }

    /// Decode a pulse width in capture ticks
    #[must_use]
    pub fn decode_ticks(&self, ticks: u16, timer: &TimerConfig) -> Option<DutyRequest> {
        self.decode(timer.ticks_to_us(u32::from(ticks)))
    }
}

/// Moving average over the last `N` pulse widths
pub struct PulseAverager<const N: usize> {
    history: HistoryBuffer<u16, N>,
}

impl<const N: usize> PulseAverager<N> {
    /// Create an empty averager
    #[must_use]
    pub const fn new() -> Self {
        Self {
            history: HistoryBuffer::new(),
        }
    }

    /// Add a width and return the current average
    pub fn push(&mut self, ticks: u16) -> u16 {
        self.history.write(ticks);
        self.average().unwrap_or(ticks)
    }

    /// Average of the stored widths
    #[must_use]
    pub fn average(&self) -> Option<u16> {
        let samples = self.history.as_slice();
        if samples.is_empty() {
            return None;
        }
        let sum: u32 = samples.iter().copied().map(u32::from).sum();
        // mean of u16 values fits u16
        Some((sum / samples.len() as u32) as u16)
    }

    /// Drop all stored widths
    pub fn clear(&mut self) {
        self.history.clear();
    }
}

impl<const N: usize> Default for PulseAverager<N> {
    fn default() -> Self {
        Self::new()
    }
}
