//! GPIO Abstractions
//!
//! Status LED and the pulse input line.

use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::Output;

use crate::types::Edge;

/// Status LED state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LedState {
    /// LED is off
    #[default]
    Off,
    /// LED is on
    On,
}

impl LedState {
    /// Toggle the LED state
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }
}

impl defmt::Format for LedState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Off => defmt::write!(f, "OFF"),
            Self::On => defmt::write!(f, "ON"),
        }
    }
}

/// Status LED driver
pub struct StatusLed<'d> {
    pin: Output<'d>,
    state: LedState,
}

impl<'d> StatusLed<'d> {
    /// Create a new status LED (initially off)
    #[must_use]
    pub fn new(mut pin: Output<'d>) -> Self {
        pin.set_low();
        Self {
            pin,
            state: LedState::Off,
        }
    }

    /// Set the LED to a given state
    pub fn set(&mut self, state: LedState) {
        match state {
            LedState::On => self.pin.set_high(),
            LedState::Off => self.pin.set_low(),
        }
        self.state = state;
    }

    /// Toggle LED state
    pub fn toggle(&mut self) {
        self.set(self.state.toggle());
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> LedState {
        self.state
    }
}

/// Servo pulse input on an EXTI line
pub struct PulseInput<'d> {
    pin: ExtiInput<'d>,
}

impl<'d> PulseInput<'d> {
    /// Wrap an EXTI input (pull-up configured by the caller)
    #[must_use]
    pub fn new(pin: ExtiInput<'d>) -> Self {
        Self { pin }
    }

    /// Wait for the next transition and report its direction
    ///
    /// The direction is read back from the line after the wake-up, so a
    /// pulse shorter than the wake-up latency reads as the wrong edge; the
    /// watchdog counts that as a polarity error.
    pub async fn next_edge(&mut self) -> Edge {
        self.pin.wait_for_any_edge().await;
        if self.pin.is_high() {
            Edge::Rising
        } else {
            Edge::Falling
        }
    }
}
