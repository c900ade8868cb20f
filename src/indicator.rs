//! Front-panel power LED.

use embedded_hal::digital::OutputPin;

use crate::supervisor::SystemState;

/// LED policy: lit only while the host is powered.
pub fn led_should_be_on(state: SystemState) -> bool {
    matches!(state, SystemState::On)
}

/// Chassis power LED driven from supervisor states.
///
/// Only writes that succeed are remembered; after a failed write the level
/// is unknown and the next [`show`](Self::show) drives the pin again.
pub struct PowerLed<P> {
    pin: P,
    lit: Option<bool>,
}

impl<P: OutputPin> PowerLed<P> {
    /// Wrap the LED pin and switch it off.
    pub fn new(mut pin: P) -> Self {
        let lit = match pin.set_low() {
            Ok(()) => Some(false),
            Err(_) => {
                warn!("Power LED write failed");
                None
            }
        };
        Self { pin, lit }
    }

    /// Update the LED for `state`.  Returns whether it is now lit.
    pub fn show(&mut self, state: SystemState) -> bool {
        let on = led_should_be_on(state);
        if self.lit != Some(on) {
            let written = if on {
                self.pin.set_high()
            } else {
                self.pin.set_low()
            };
            self.lit = match written {
                Ok(()) => Some(on),
                Err(_) => {
                    warn!("Power LED write failed");
                    None
                }
            };
        }
        self.is_lit()
    }

    pub fn is_lit(&self) -> bool {
        self.lit == Some(true)
    }
}
