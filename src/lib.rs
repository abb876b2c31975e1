//! OpenPWM Motor Firmware Library
//!
//! Core of a single-axis bidirectional motor speed controller. A signed
//! duty request is mapped onto two complementary PWM channels driving an
//! H-bridge, and the request is derived from a servo-style pulse input
//! whose edges are timed on a free-running counter.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CONTROL LOOP (20 ms)                      │
//! │  poll watchdog  →  decode pulse  →  map duty  →  PWM sink    │
//! ├─────────────────────────────────────────────────────────────┤
//! │           INTERRUPT CONTEXT (edge / counter overflow)        │
//! │        SharedWatchdog::on_edge    SharedWatchdog::on_overflow│
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL (embedded feature)                     │
//! │  EXTI pulse input  │  capture counter  │  TIM1 PWM  │  LED   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The duty mapper and the watchdog never call each other; the control
//! loop composes them.
//!
//! # Features
//!
//! - `std` (default): host build, logs through `log`
//! - `embedded`: `no_std` target build with embassy, logs through `defmt`
//! - `bench-ramp`: firmware drives the bench ramp instead of the pulse input

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[macro_use]
mod fmt;

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Hardware Abstraction Layer
///
/// Pulse input, capture counter, bridge PWM and status LED on STM32G474.
#[cfg(feature = "embedded")]
pub mod hal;

/// Motor Output
///
/// Duty mapping, H-bridge sink, bench ramp.
pub mod motor;

/// Pulse Input
///
/// Capture timing, signal watchdog, servo decoding.
pub mod signal;

/// Control loop composition
pub mod control;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    pub use crate::control::{LinkStatus, MotorController};
    pub use crate::motor::duty::map_duty;
    pub use crate::motor::output::{HBridgeOutput, PwmSink};
    pub use crate::signal::shared::SharedWatchdog;
    pub use crate::signal::watchdog::{Reading, Snapshot, WatchdogConfig};

    // Embassy
    pub use embassy_time::{Duration, Instant, Ticker, Timer};

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
