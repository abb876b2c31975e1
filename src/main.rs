//! OpenPWM Motor Controller Main Application
//!
//! Entry point for the H-bridge motor firmware. Initializes hardware and
//! spawns the pulse capture, overflow and control tasks.

#![no_std]
#![no_main]

use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Level, Output, Speed};
#[cfg(not(feature = "bench-ramp"))]
use embassy_stm32::{exti::ExtiInput, gpio::Pull};
use {defmt_rtt as _, panic_probe as _};

use openpwm::hal::gpio::{LedState, StatusLed};
use openpwm::hal::pwm::{self, BridgePwm};
#[cfg(not(feature = "bench-ramp"))]
use openpwm::hal::{gpio::PulseInput, timer::CaptureCounter};
#[cfg(feature = "bench-ramp")]
use openpwm::motor::ramp::RampTest;
use openpwm::prelude::*;

/// Watchdog shared between the capture tasks and the control loop
#[cfg(not(feature = "bench-ramp"))]
static WATCHDOG: SharedWatchdog = SharedWatchdog::new(WatchdogConfig::DEFAULT);

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("OpenPWM motor firmware v{}", env!("CARGO_PKG_VERSION"));

    let config = embassy_stm32::Config::default();
    let p = embassy_stm32::init(config);

    info!("Peripherals initialized");

    let led = StatusLed::new(Output::new(p.PA5, Level::Low, Speed::Low));
    let bridge = pwm::bridge(p.TIM1, p.PA8, p.PA9);

    info!("Bridge PWM on TIM1 at {}Hz", PWM_FREQUENCY_HZ);

    let timer = unwrap!(capture_timer());
    let decoder = unwrap!(servo_decoder());
    let controller = MotorController::new(bridge, decoder, timer);

    #[cfg(feature = "bench-ramp")]
    {
        info!("Bench ramp mode");
        unwrap!(spawner.spawn(ramp_task(controller, led)));
    }

    #[cfg(not(feature = "bench-ramp"))]
    {
        WATCHDOG.reconfigure(unwrap!(signal_watchdog(&timer)));
        info!("{}", timer);

        let counter = CaptureCounter::start(timer);
        let input = PulseInput::new(ExtiInput::new(p.PA0, p.EXTI0, Pull::Up));

        unwrap!(spawner.spawn(edge_task(input, counter)));
        unwrap!(spawner.spawn(overflow_task(counter)));
        unwrap!(spawner.spawn(control_task(controller, led)));
    }

    info!("Tasks spawned");
}

/// Timestamps every transition of the pulse input
#[cfg(not(feature = "bench-ramp"))]
#[embassy_executor::task]
async fn edge_task(mut input: PulseInput<'static>, counter: CaptureCounter) {
    loop {
        let edge = input.next_edge().await;
        WATCHDOG.on_edge(edge, counter.now());
    }
}

/// Delivers an overflow notification at every counter wrap
#[cfg(not(feature = "bench-ramp"))]
#[embassy_executor::task]
async fn overflow_task(counter: CaptureCounter) {
    loop {
        Timer::at(counter.next_wrap()).await;
        WATCHDOG.on_overflow(counter.now());
    }
}

/// Polls the watchdog and drives the bridge
#[cfg(not(feature = "bench-ramp"))]
#[embassy_executor::task]
async fn control_task(mut controller: MotorController<BridgePwm>, mut led: StatusLed<'static>) {
    let mut ticker = Ticker::every(Duration::from_millis(CONTROL_PERIOD_MS));
    let blink_ticks = (LED_BLINK_MS / CONTROL_PERIOD_MS).max(1);
    let mut tick: u64 = 0;

    loop {
        if let Err(never) = controller.apply(WATCHDOG.snapshot()) {
            match never {}
        }

        match controller.link() {
            LinkStatus::Active => led.set(LedState::On),
            LinkStatus::Lost if tick % blink_ticks == 0 => led.toggle(),
            LinkStatus::Lost => {}
            LinkStatus::NeverConnected => led.set(LedState::Off),
        }

        // Once per second
        if tick % (1_000 / CONTROL_PERIOD_MS) == 0 {
            debug!(
                "{} {} {} [{}]",
                controller.link(),
                controller.duty(),
                controller.pair(),
                WATCHDOG.stats()
            );
        }

        tick = tick.wrapping_add(1);
        ticker.next().await;
    }
}

/// Sweeps the bridge through the bench ramp, blinking the LED each step
#[cfg(feature = "bench-ramp")]
#[embassy_executor::task]
async fn ramp_task(mut controller: MotorController<BridgePwm>, mut led: StatusLed<'static>) {
    let half = Duration::from_millis(RAMP_PERIOD_MS / 2);

    for duty in RampTest::new() {
        led.set(LedState::On);
        Timer::after(half).await;
        led.set(LedState::Off);
        Timer::after(half).await;

        if let Err(never) = controller.drive(duty) {
            match never {}
        }
    }
}
