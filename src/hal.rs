//! Hardware Abstraction Layer
//!
//! Embassy-backed pulse input, capture counter, bridge PWM and status LED.
//! Everything above this layer is target independent.

pub mod gpio;
pub mod pwm;
pub mod timer;
