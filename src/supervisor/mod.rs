//! ATX power supervisor.
//!
//! Owns the PS_ON# output and watches PWR_OK and the host's soft-off line.
//! The supervisor is driven entirely by [`Supervisor::poll`], called from a
//! single cooperative loop, plus [`Supervisor::handle_button`] for the
//! debounced power-button notifications.
//!
//! ## Transitions (evaluated once per poll, first match wins)
//!
//! 1. PS_ON# de-asserted and PWR_OK low → `Off`
//! 2. PWR_OK rising while not `On` → `On`
//! 3. PWR_OK falling while `On` → `Off`
//!
//! The soft-off detector ([`soft_off`]) may additionally force `Off` once
//! the host has stopped asserting its soft-off line for long enough.
//!
//! Two steps stall the caller on purpose: the settle pause after entering
//! `Off`, and one confirmation step per poll while a soft-off is pending.
//! Both go through the [`DelayNs`] provider so tests can substitute a
//! virtual clock.

mod listener;
mod soft_off;


pub use listener::{Callbacks, PowerListener};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin, PinState, StatefulOutputPin};

use crate::button::ButtonEvent;
use crate::config;
use crate::error::Error;

/// The supervisor's belief about PSU / host power.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemState {
    /// PSU disabled; no host expected to be running.
    #[default]
    Off = 0,
    /// PSU enabled, host booting.  No current transition enters this state.
    Init = 1,
    /// PWR_OK asserted; host presumed running.
    On = 2,
}

/// Timings and signal polarities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Stall after entering `Off` (ms).
    pub off_settle_ms: u32,
    /// Soft-off must accumulate this long before power is cut (ms).
    pub soft_off_threshold_ms: u32,
    /// Confirmation step per poll while soft-off is pending (ms).
    pub soft_off_step_ms: u32,
    /// Level of PS_ON# that makes the PSU deliver power.
    pub psu_enable_active: PinState,
    /// Level of PWR_OK that means the rails are good.
    pub power_good_active: PinState,
    /// Level of the soft-off line that means the host is running.
    pub soft_off_sense_active: PinState,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            off_settle_ms: config::OFF_SETTLE_MS,
            soft_off_threshold_ms: config::SOFT_OFF_THRESHOLD_MS,
            soft_off_step_ms: config::SOFT_OFF_STEP_MS,
            psu_enable_active: config::PSU_ENABLE_ACTIVE_LEVEL,
            power_good_active: config::POWER_GOOD_ACTIVE_LEVEL,
            soft_off_sense_active: config::SOFT_OFF_SENSE_ACTIVE_LEVEL,
        }
    }
}

/// The digital signals owned by the supervisor.
pub struct Pins<EN, PG, SO> {
    /// PS_ON# output.
    pub psu_enable: EN,
    /// PWR_OK input.
    pub power_good: PG,
    /// Host soft-off sense input.
    pub soft_off_sense: SO,
}

/// One consistent sample of the inputs, taken at the start of a poll.
#[derive(Clone, Copy, Debug)]
struct Inputs {
    psu_enabled: bool,
    power_good: bool,
    host_active: bool,
}

pub struct Supervisor<EN, PG, SO, D, L> {
    pins: Pins<EN, PG, SO>,
    delay: D,
    listener: L,
    config: SupervisorConfig,

    initialized: bool,
    state: SystemState,
    last_state: SystemState,
    last_power_good: bool,
    button_held: bool,
    soft_off_armed: bool,
    soft_off_elapsed_ms: u32,
}

impl<EN, PG, SO, D, L> Supervisor<EN, PG, SO, D, L>
where
    EN: OutputPin + StatefulOutputPin,
    PG: InputPin,
    SO: InputPin,
    D: DelayNs,
    L: PowerListener,
{
    /// Build a supervisor.  Nothing is driven until [`initialize`](Self::initialize).
    pub fn new(pins: Pins<EN, PG, SO>, delay: D, listener: L, config: SupervisorConfig) -> Self {
        Self {
            pins,
            delay,
            listener,
            config,
            initialized: false,
            state: SystemState::Off,
            last_state: SystemState::Off,
            last_power_good: false,
            button_held: false,
            soft_off_armed: false,
            soft_off_elapsed_ms: 0,
        }
    }

    /// De-assert PS_ON# and start from `Off`.  Safe to call again; if the
    /// host was powered, listeners get `power_off`.
    pub fn initialize(&mut self) -> Result<(), Error> {
        self.set_psu_enable(false)?;

        let was_powered = self.initialized && self.state != SystemState::Off;
        self.state = SystemState::Off;
        self.last_state = SystemState::Off;
        self.last_power_good = false;
        self.button_held = false;
        self.soft_off_armed = false;
        self.soft_off_elapsed_ms = 0;
        self.initialized = true;

        info!("Supervisor initialized, PSU off");
        if was_powered {
            self.listener.power_off();
        }
        Ok(())
    }

    /// Run one supervision cycle.
    ///
    /// Does nothing before [`initialize`](Self::initialize).  On a pin fault
    /// the cycle is abandoned before any state changes.
    pub fn poll(&mut self) -> Result<(), Error> {
        if !self.initialized {
            return Ok(());
        }

        let inputs = self.sample()?;

        self.apply_transitions(&inputs);
        if self.state != self.last_state {
            self.enter(self.state);
        }

        if self.host_booted(inputs.host_active) {
            self.arm_soft_off_detection();
        }

        self.detect_soft_off(inputs.host_active)
    }

    /// Apply a debounced power-button notification.
    pub fn handle_button(&mut self, event: ButtonEvent) -> Result<(), Error> {
        if !self.initialized {
            return Ok(());
        }

        match event {
            ButtonEvent::Pressed => {
                debug!("Power button down");
                self.button_held = true;
            }
            ButtonEvent::Released => {
                debug!("Power button up");
                let power_up = self.state == SystemState::Off && self.button_held;
                self.button_held = false;
                if power_up {
                    info!("Powering up");
                    self.set_psu_enable(true)?;
                }
            }
            ButtonEvent::Held => {
                debug!("Power button hold");
                if self.state != SystemState::Off {
                    info!("Forced power-off: dropping PSU");
                    self.set_psu_enable(false)?;
                }
            }
        }
        Ok(())
    }

    pub fn state(&self) -> SystemState {
        self.state
    }

    /// Whether a press has been seen without its release yet.
    pub fn is_button_held(&self) -> bool {
        self.button_held
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Current commanded level of PS_ON#, as asserted / de-asserted.
    pub fn psu_enabled(&mut self) -> Result<bool, Error> {
        let high = self
            .pins
            .psu_enable
            .is_set_high()
            .map_err(|_| Error::PsuEnable)?;
        Ok(high == (self.config.psu_enable_active == PinState::High))
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    fn sample(&mut self) -> Result<Inputs, Error> {
        let psu_enabled = self.psu_enabled()?;
        let power_good = read_asserted(
            &mut self.pins.power_good,
            self.config.power_good_active,
            Error::PowerGood,
        )?;
        let host_active = read_asserted(
            &mut self.pins.soft_off_sense,
            self.config.soft_off_sense_active,
            Error::SoftOffSense,
        )?;
        trace!(
            "psu_enabled: {} | power_good: {} | host_active: {}",
            psu_enabled,
            power_good,
            host_active
        );
        Ok(Inputs {
            psu_enabled,
            power_good,
            host_active,
        })
    }

    fn apply_transitions(&mut self, inputs: &Inputs) {
        if !inputs.psu_enabled && !inputs.power_good {
            self.state = SystemState::Off;
        } else if inputs.power_good != self.last_power_good {
            debug!("PWR_OK changed: {}", inputs.power_good);
            if inputs.power_good && self.state != SystemState::On {
                self.state = SystemState::On;
            } else if !inputs.power_good && self.state == SystemState::On {
                self.state = SystemState::Off;
            }
        }
        self.last_power_good = inputs.power_good;
    }

    fn enter(&mut self, state: SystemState) {
        info!("System state: {} -> {}", self.last_state, state);
        self.last_state = state;

        match state {
            SystemState::On => self.listener.power_on(),
            SystemState::Off => {
                self.button_held = false;
                self.disarm_soft_off_detection();
                self.listener.power_off();
                self.delay.delay_ms(self.config.off_settle_ms);
            }
            SystemState::Init => self.listener.power_init(),
        }
    }

    fn set_psu_enable(&mut self, asserted: bool) -> Result<(), Error> {
        let active = self.config.psu_enable_active;
        let level = if asserted { active } else { !active };
        self.pins
            .psu_enable
            .set_state(level)
            .map_err(|_| Error::PsuEnable)
    }
}

fn read_asserted<P: InputPin>(pin: &mut P, active: PinState, error: Error) -> Result<bool, Error> {
    let high = pin.is_high().map_err(|_| error)?;
    Ok(high == (active == PinState::High))
}
