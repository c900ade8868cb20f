//! atx-pmu firmware - ATX power management for a Raspberry Pi on nRF52840.
//!
//! Task layout:
//!
//! - **supervisor** - samples the power button every few ms, forwards
//!   debounced events, and polls the power supervisor.  It owns PS_ON#,
//!   PWR_OK and the host soft-off line.
//! - **led** - waits for state notifications and drives the chassis power
//!   LED.
//!
//! The supervisor deliberately blocks its task during the OFF settle pause
//! and the soft-off confirmation steps.

#![no_std]
#![no_main]

use atx_pmu::config;
use atx_pmu::{
    ButtonTracker, Callbacks, Pins, PowerButton, PowerLed, Supervisor, SupervisorConfig,
    SystemState,
};
use defmt::{info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Input, Level, Output, OutputDrive, Pull};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Delay, Duration, Instant, Ticker};
use embedded_hal::digital::PinState;
use {defmt_rtt as _, panic_probe as _};

type PsuSupervisor =
    Supervisor<Output<'static>, Input<'static>, Input<'static>, Delay, Callbacks>;

/// Latest supervisor state, consumed by the LED task.
static POWER_INDICATION: Signal<CriticalSectionRawMutex, SystemState> = Signal::new();

fn notify_power_on() {
    POWER_INDICATION.signal(SystemState::On);
}

fn notify_power_off() {
    POWER_INDICATION.signal(SystemState::Off);
}

fn notify_power_init() {
    POWER_INDICATION.signal(SystemState::Init);
}

fn level(state: PinState) -> Level {
    match state {
        PinState::High => Level::High,
        PinState::Low => Level::Low,
    }
}

#[embassy_executor::task]
async fn supervisor_task(mut supervisor: PsuSupervisor, mut button: PowerButton<Input<'static>>) {
    info!("Starting supervisor task");

    let mut ticker = Ticker::every(Duration::from_millis(config::SUPERVISOR_POLL_MS));

    loop {
        match button.poll(Instant::now().as_millis()) {
            Ok(Some(event)) => {
                if let Err(e) = supervisor.handle_button(event) {
                    warn!("Button {} not applied: {}", event, e);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Button sample failed: {}", e),
        }

        if let Err(e) = supervisor.poll() {
            warn!("Supervisor poll aborted: {}", e);
        }

        ticker.next().await;
    }
}

#[embassy_executor::task]
async fn led_task(mut led: PowerLed<Output<'static>>) {
    info!("Starting LED task");

    loop {
        let state = POWER_INDICATION.wait().await;
        match state {
            SystemState::On => info!("System initialized."),
            SystemState::Off => info!("System shutdown detected."),
            SystemState::Init => info!("System initializing..."),
        }
        led.show(state);
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(Default::default());

    info!("RaspiATX - PMU v{}", config::FIRMWARE_VERSION);

    // PS_ON# starts de-asserted so the PSU stays off until the button is used.
    let ps_on = Output::new(
        p.P0_03,
        level(!config::PSU_ENABLE_ACTIVE_LEVEL),
        OutputDrive::Standard,
    );
    let power_good = Input::new(p.P0_30, Pull::None);
    let soft_off = Input::new(p.P0_29, Pull::Down);
    let button = Input::new(p.P0_04, Pull::Up);
    let led = PowerLed::new(Output::new(p.P0_28, Level::Low, OutputDrive::Standard));

    let callbacks = Callbacks::new()
        .on_power_on(notify_power_on)
        .on_power_off(notify_power_off)
        .on_power_init(notify_power_init);

    let mut supervisor = Supervisor::new(
        Pins {
            psu_enable: ps_on,
            power_good,
            soft_off_sense: soft_off,
        },
        Delay,
        callbacks,
        SupervisorConfig::default(),
    );
    unwrap!(supervisor.initialize());

    let button = PowerButton::new(
        button,
        config::BUTTON_ACTIVE_LEVEL,
        ButtonTracker::new(config::BUTTON_POLL_INTERVAL_MS, config::POWER_OFF_HOLD_MS),
    );

    info!("Initialization successful, spawning tasks");

    unwrap!(spawner.spawn(led_task(led)));
    unwrap!(spawner.spawn(supervisor_task(supervisor, button)));
}
