//! Motor Output
//!
//! Signed duty mapping, the H-bridge output sink and the bench ramp.

pub mod duty;
pub mod output;
pub mod ramp;
