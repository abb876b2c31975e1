//! System configuration and hardware constants
//!
//! Compile-time constants for the motor controller. Pin mappings, clock
//! rates, pulse calibration and the loss timeout are centralized here and
//! turned into validated runtime configuration by the constructors below.

use crate::signal::servo::ServoDecoder;
use crate::signal::timer::TimerConfig;
use crate::signal::watchdog::WatchdogConfig;
use crate::signal::ConfigError;

/// Clock feeding the capture counter before the prescaler (1 MHz time base)
pub const CAPTURE_CLOCK_HZ: u32 = 1_000_000;

/// Capture counter period must exceed the longest valid pulse (2 ms)
pub const MIN_CAPTURE_PERIOD_US: u32 = 2_000;

/// Signal-loss timeout; longer than one 50 Hz servo frame
pub const SIGNAL_TIMEOUT_US: u32 = 25_000;

/// Control loop period in milliseconds
pub const CONTROL_PERIOD_MS: u64 = 20;

/// H-bridge PWM frequency (8 MHz / 256)
pub const PWM_FREQUENCY_HZ: u32 = 31_250;

/// Servo pulse width for "stop"
pub const SERVO_CENTER_US: u32 = 1_500;

/// Pulse offset from center that commands full duty
pub const SERVO_HALF_SPAN_US: u32 = 500;

/// Pulse offsets within this band around center command zero
pub const SERVO_DEADBAND_US: u32 = 20;

/// Shortest pulse accepted as a servo command
pub const SERVO_MIN_VALID_US: u32 = 800;

/// Longest pulse accepted as a servo command
pub const SERVO_MAX_VALID_US: u32 = 2_200;

/// Number of servo pulses averaged into one command
pub const PULSE_AVERAGE_WINDOW: usize = 4;

/// Bench ramp: duty step per tick
pub const RAMP_STEP: i32 = -10;

/// Bench ramp: restart at zero once the duty falls below this
pub const RAMP_FLOOR: i32 = -300;

/// Bench ramp: tick period in milliseconds (10 ms LED on + 10 ms off)
pub const RAMP_PERIOD_MS: u64 = 20;

/// Status LED blink half-period while the signal is lost
pub const LED_BLINK_MS: u64 = 250;

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments (Nucleo-G474RE)

    /// Reverse leg output (TIM1 CH1)
    pub const REV: &str = "PA8";

    /// Forward leg output (TIM1 CH2)
    pub const FWD: &str = "PA9";

    /// Servo pulse input with pull-up (EXTI0)
    pub const PWM_IN: &str = "PA0";

    /// Status LED
    pub const LED: &str = "PA5";

    /// Motor temperature sense (reserved)
    pub const TEMP: &str = "PA4";
}

/// Timer assignments
pub mod timers {
    //! Hardware timer assignments

    /// H-bridge PWM timer
    pub const BRIDGE_PWM: u8 = 1;
}

/// Capture counter configuration for the default clock
///
/// # Errors
///
/// Returns [`ConfigError`] if no prescaler gives a period above
/// [`MIN_CAPTURE_PERIOD_US`].
pub fn capture_timer() -> Result<TimerConfig, ConfigError> {
    TimerConfig::select(CAPTURE_CLOCK_HZ, MIN_CAPTURE_PERIOD_US)
}

/// Watchdog configuration using [`SIGNAL_TIMEOUT_US`]
///
/// # Errors
///
/// Returns [`ConfigError`] if the timeout does not exceed the longest valid
/// pulse or does not fit the tick range of `timer`.
pub fn signal_watchdog(timer: &TimerConfig) -> Result<WatchdogConfig, ConfigError> {
    WatchdogConfig::from_timeout_us(SIGNAL_TIMEOUT_US, SERVO_MAX_VALID_US, timer)
}

/// Servo decoder using the calibration constants
///
/// # Errors
///
/// Returns [`ConfigError`] if the calibration is inconsistent.
pub fn servo_decoder() -> Result<ServoDecoder, ConfigError> {
    ServoDecoder::new(
        SERVO_CENTER_US,
        SERVO_HALF_SPAN_US,
        SERVO_DEADBAND_US,
        SERVO_MIN_VALID_US..=SERVO_MAX_VALID_US,
    )
}
