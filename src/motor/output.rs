//! H-Bridge Output
//!
//! The PWM output sink and its implementation over two
//! `embedded-hal` PWM channels sharing one timer.

use embedded_hal::pwm::SetDutyCycle;

use super::duty::map_duty;
use crate::types::{DutyRequest, PwmChannelPair};

/// Receiver of comparator threshold pairs
pub trait PwmSink {
    /// Error reported by the underlying PWM hardware
    type Error;

    /// Apply both thresholds
    ///
    /// # Errors
    ///
    /// Returns the hardware error if a channel update fails.
    fn write(&mut self, pair: PwmChannelPair) -> Result<(), Self::Error>;
}

/// Bridge drive direction derived from a channel pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BridgeDirection {
    /// Both legs at 255
    #[default]
    Idle,
    /// Channel B (forward leg) active
    Forward,
    /// Channel A (reverse leg) active
    Reverse,
}

impl BridgeDirection {
    /// Direction encoded by a pair
    #[must_use]
    pub const fn of(pair: PwmChannelPair) -> Self {
        if pair.high != u8::MAX {
            Self::Reverse
        } else if pair.low != u8::MAX {
            Self::Forward
        } else {
            Self::Idle
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for BridgeDirection {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Idle => defmt::write!(f, "IDLE"),
            Self::Forward => defmt::write!(f, "FWD"),
            Self::Reverse => defmt::write!(f, "REV"),
        }
    }
}

/// Two PWM channels driving the opposite legs of an H-bridge
///
/// Thresholds are scaled from the 0..=255 range onto each channel's own
/// maximum duty.
pub struct HBridgeOutput<A, B> {
    /// Channel A (reverse leg)
    reverse: A,
    /// Channel B (forward leg)
    forward: B,
}

impl<A, B> HBridgeOutput<A, B>
where
    A: SetDutyCycle,
    B: SetDutyCycle<Error = A::Error>,
{
    /// Wrap two enabled PWM channels
    #[must_use]
    pub fn new(reverse: A, forward: B) -> Self {
        Self { reverse, forward }
    }

    /// Give the channels back
    pub fn release(self) -> (A, B) {
        (self.reverse, self.forward)
    }
}

impl<A, B> PwmSink for HBridgeOutput<A, B>
where
    A: SetDutyCycle,
    B: SetDutyCycle<Error = A::Error>,
{
    type Error = A::Error;

    /// The leg being returned to 255 is written first, so an update that
    /// reverses direction never has both legs driven at the same time.
    fn write(&mut self, pair: PwmChannelPair) -> Result<(), Self::Error> {
        let max = u16::from(u8::MAX);
        if pair.high == u8::MAX {
            self.reverse.set_duty_cycle_fraction(u16::from(pair.high), max)?;
            self.forward.set_duty_cycle_fraction(u16::from(pair.low), max)?;
        } else {
            self.forward.set_duty_cycle_fraction(u16::from(pair.low), max)?;
            self.reverse.set_duty_cycle_fraction(u16::from(pair.high), max)?;
        }
        Ok(())
    }
}

/// Duty-level front end of a [`PwmSink`]
pub struct MotorOutput<S> {
    sink: S,
    duty: DutyRequest,
    pair: PwmChannelPair,
}

impl<S: PwmSink> MotorOutput<S> {
    /// Wrap a sink; nothing is written until the first command
    #[must_use]
    pub const fn new(sink: S) -> Self {
        Self {
            sink,
            duty: DutyRequest::STOP,
            pair: PwmChannelPair::IDLE,
        }
    }

    /// Map and apply a signed duty request
    ///
    /// # Errors
    ///
    /// Returns the sink error; the previous command stays recorded.
    pub fn set_duty(&mut self, duty: DutyRequest) -> Result<PwmChannelPair, S::Error> {
        let pair = map_duty(duty);
        self.sink.write(pair)?;
        self.duty = duty;
        self.pair = pair;
        Ok(pair)
    }

    /// Return both legs to idle
    ///
    /// # Errors
    ///
    /// Returns the sink error.
    pub fn stop(&mut self) -> Result<(), S::Error> {
        self.set_duty(DutyRequest::STOP).map(|_| ())
    }

    /// Last request applied
    #[must_use]
    pub const fn duty(&self) -> DutyRequest {
        self.duty
    }

    /// Last pair written
    #[must_use]
    pub const fn pair(&self) -> PwmChannelPair {
        self.pair
    }

    /// Direction currently driven
    #[must_use]
    pub const fn direction(&self) -> BridgeDirection {
        BridgeDirection::of(self.pair)
    }

    /// Borrow the sink
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }
}
