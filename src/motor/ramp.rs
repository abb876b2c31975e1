//! Bench Ramp
//!
//! Sweeps the duty from zero towards full reverse and starts over, for
//! checking the output stage without a pulse input.

use crate::config::{RAMP_FLOOR, RAMP_STEP};
use crate::types::DutyRequest;

/// Endless duty sweep
#[derive(Clone, Copy, Debug)]
pub struct RampTest {
    duty: i32,
    step: i32,
    floor: i32,
}

impl RampTest {
    /// Sweep with the configured step and floor
    #[must_use]
    pub const fn new() -> Self {
        Self::with_limits(RAMP_STEP, RAMP_FLOOR)
    }

    /// Sweep by `step` per tick, restarting at zero once below `floor`
    #[must_use]
    pub const fn with_limits(step: i32, floor: i32) -> Self {
        Self {
            duty: 0,
            step,
            floor,
        }
    }
}

impl Default for RampTest {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for RampTest {
    type Item = DutyRequest;

    fn next(&mut self) -> Option<Self::Item> {
        self.duty = self.duty.saturating_add(self.step);
        if self.duty < self.floor {
            self.duty = 0;
        }
        Some(DutyRequest::new(self.duty))
    }
}
