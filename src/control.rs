//! Motor Control
//!
//! Composes the watchdog reading, the servo decoder and the motor output
//! once per control tick. Signal loss always ends in a stopped motor.

use crate::config::PULSE_AVERAGE_WINDOW;
use crate::motor::output::{MotorOutput, PwmSink};
use crate::signal::servo::{PulseAverager, ServoDecoder};
use crate::signal::timer::TimerConfig;
use crate::signal::watchdog::{Reading, Snapshot};
use crate::types::{DutyRequest, PwmChannelPair};

/// Pulse link status as seen by the controller
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LinkStatus {
    /// No valid pulse since start
    #[default]
    NeverConnected,
    /// Valid pulses arriving
    Active,
    /// Watchdog reported loss
    Lost,
}

#[cfg(feature = "embedded")]
impl defmt::Format for LinkStatus {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::NeverConnected => defmt::write!(f, "NEVER"),
            Self::Active => defmt::write!(f, "ACTIVE"),
            Self::Lost => defmt::write!(f, "LOST"),
        }
    }
}

/// Pulse-input motor controller
pub struct MotorController<S> {
    output: MotorOutput<S>,
    decoder: ServoDecoder,
    timer: TimerConfig,
    averager: PulseAverager<PULSE_AVERAGE_WINDOW>,
    link: LinkStatus,
    invalid_pulses: u32,
    /// Sequence of the last measurement applied
    last_sequence: Option<u32>,
}

impl<S: PwmSink> MotorController<S> {
    /// Create a controller; the motor is not driven until the first update
    #[must_use]
    pub const fn new(sink: S, decoder: ServoDecoder, timer: TimerConfig) -> Self {
        Self {
            output: MotorOutput::new(sink),
            decoder,
            timer,
            averager: PulseAverager::new(),
            link: LinkStatus::NeverConnected,
            invalid_pulses: 0,
            last_sequence: None,
        }
    }

    /// Apply one watchdog reading and return the request written
    ///
    /// - `Lost` and `Waiting` stop the motor.
    /// - A high pulse inside the envelope is averaged and decoded.
    /// - A high pulse outside the envelope stops the motor.
    /// - A low interval keeps the current command.
    ///
    /// # Errors
    ///
    /// Returns the sink error if the output update fails.
    pub fn update(&mut self, reading: Reading) -> Result<DutyRequest, S::Error> {
        let request = match reading {
            Reading::Lost => {
                if self.link != LinkStatus::Lost {
                    log_warn!("pulse signal lost, stopping motor");
                }
                self.link = LinkStatus::Lost;
                self.averager.clear();
                DutyRequest::STOP
            }
            Reading::Waiting => DutyRequest::STOP,
            Reading::Measurement(m) if m.is_high() => self.decode_pulse(m.ticks),
            Reading::Measurement(_) => self.output.duty(),
        };

        self.output.set_duty(request)?;
        Ok(request)
    }

    /// Apply a watchdog snapshot
    ///
    /// A measurement already applied (same sequence) keeps the current
    /// command without touching the averager or the sink. Everything else
    /// goes through [`Self::update`].
    ///
    /// # Errors
    ///
    /// Returns the sink error if the output update fails.
    pub fn apply(&mut self, snapshot: Snapshot) -> Result<DutyRequest, S::Error> {
        if let Reading::Measurement(_) = snapshot.reading {
            if self.last_sequence == Some(snapshot.sequence) {
                return Ok(self.output.duty());
            }
            self.last_sequence = Some(snapshot.sequence);
        }
        self.update(snapshot.reading)
    }

    /// Drive a request directly, bypassing the pulse input
    ///
    /// # Errors
    ///
    /// Returns the sink error if the output update fails.
    pub fn drive(&mut self, request: DutyRequest) -> Result<PwmChannelPair, S::Error> {
        self.output.set_duty(request)
    }

    /// Current link status
    #[must_use]
    pub const fn link(&self) -> LinkStatus {
        self.link
    }

    /// Last request applied
    #[must_use]
    pub const fn duty(&self) -> DutyRequest {
        self.output.duty()
    }

    /// Last pair written
    #[must_use]
    pub const fn pair(&self) -> PwmChannelPair {
        self.output.pair()
    }

    /// High pulses rejected for lying outside the envelope
    #[must_use]
    pub const fn invalid_pulses(&self) -> u32 {
        self.invalid_pulses
    }

    /// Motor output
    #[must_use]
    pub const fn output(&self) -> &MotorOutput<S> {
        &self.output
    }

    fn decode_pulse(&mut self, ticks: u16) -> DutyRequest {
        let width_us = self.timer.ticks_to_us(u32::from(ticks));
        if !self.decoder.is_valid(width_us) {
            self.invalid_pulses = self.invalid_pulses.wrapping_add(1);
            log_debug!("pulse of {} us outside envelope", width_us);
            return DutyRequest::STOP;
        }

        let average = self.averager.push(ticks);
        match self.decoder.decode_ticks(average, &self.timer) {
            Some(request) => {
                if self.link != LinkStatus::Active {
                    log_info!("pulse signal acquired ({} us)", width_us);
                }
                self.link = LinkStatus::Active;
                request
            }
            None => DutyRequest::STOP,
        }
    }
}
