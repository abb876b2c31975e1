//! PWM Driver
//!
//! Sets up TIM1 channels 1 and 2 as the complementary pair driving the
//! H-bridge legs. Both channels share the timer's counter, so one update
//! period covers both thresholds.

use embassy_stm32::gpio::OutputType;
use embassy_stm32::peripherals::{PA8, PA9, TIM1};
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm, SimplePwmChannel};

use crate::config::PWM_FREQUENCY_HZ;
use crate::motor::output::HBridgeOutput;

/// H-bridge output on TIM1 CH1 (reverse) and CH2 (forward)
pub type BridgePwm = HBridgeOutput<SimplePwmChannel<'static, TIM1>, SimplePwmChannel<'static, TIM1>>;

/// Configure TIM1 for the bridge and return the output with both legs idle
#[must_use]
pub fn bridge(tim: TIM1, rev: PA8, fwd: PA9) -> BridgePwm {
    let rev_pin = PwmPin::new_ch1(rev, OutputType::PushPull);
    let fwd_pin = PwmPin::new_ch2(fwd, OutputType::PushPull);

    let pwm = SimplePwm::new(
        tim,
        Some(rev_pin),
        Some(fwd_pin),
        None,
        None,
        Hertz(PWM_FREQUENCY_HZ),
        CountingMode::EdgeAlignedUp,
    );

    let mut channels = pwm.split();
    // Idle is 255 on both legs: permanently asserted
    channels.ch1.set_duty_cycle_fully_on();
    channels.ch2.set_duty_cycle_fully_on();
    channels.ch1.enable();
    channels.ch2.enable();

    HBridgeOutput::new(channels.ch1, channels.ch2)
}
