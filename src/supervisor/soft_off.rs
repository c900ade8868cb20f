//! Soft-off detection.
//!
//! When the host OS halts it drops its soft-off line while the PSU is
//! still delivering power.  Once armed, each poll that sees the line low
//! stalls for one confirmation step and adds it to an accumulator; a poll
//! that sees it high again resets the accumulator.  When the accumulator
//! has reached the threshold, the next poll cuts power.
//!
//! The accumulate-then-confirm scheme rides out short glitches on the
//! sense line without a separate debouncer, at step-sized resolution.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin, StatefulOutputPin};

use super::{PowerListener, Supervisor, SystemState};
use crate::error::Error;

impl<EN, PG, SO, D, L> Supervisor<EN, PG, SO, D, L>
where
    EN: OutputPin + StatefulOutputPin,
    PG: InputPin,
    SO: InputPin,
    D: DelayNs,
    L: PowerListener,
{
    /// Allow the soft-off timer to run.  No effect if already armed.
    pub fn arm_soft_off_detection(&mut self) {
        if self.soft_off_armed {
            return;
        }
        self.soft_off_armed = true;
        self.soft_off_elapsed_ms = 0;
        info!("Soft-off detection enabled");
    }

    /// Stop the soft-off timer and clear it.  No effect if already disarmed.
    pub fn disarm_soft_off_detection(&mut self) {
        if !self.soft_off_armed {
            return;
        }
        self.soft_off_armed = false;
        self.soft_off_elapsed_ms = 0;
        info!("Soft-off detection disabled");
    }

    pub fn is_soft_off_armed(&self) -> bool {
        self.soft_off_armed
    }

    /// Time the soft-off condition has persisted so far (ms).
    pub fn soft_off_elapsed_ms(&self) -> u32 {
        self.soft_off_elapsed_ms
    }

    /// The host counts as booted while powered and asserting its soft-off line.
    pub(super) fn host_booted(&self, host_active: bool) -> bool {
        self.state != SystemState::Off && host_active
    }

    pub(super) fn detect_soft_off(&mut self, host_active: bool) -> Result<(), Error> {
        if !self.soft_off_armed {
            return Ok(());
        }

        let powered = self.state != SystemState::Off;
        if powered == self.host_booted(host_active) {
            // Both off, or both running: nothing pending.
            self.soft_off_elapsed_ms = 0;
            return Ok(());
        }

        if self.soft_off_elapsed_ms < self.config.soft_off_threshold_ms {
            let step = self.config.soft_off_step_ms;
            debug!(
                "Soft-off pending: {} ms of {} ms",
                self.soft_off_elapsed_ms,
                self.config.soft_off_threshold_ms
            );
            self.delay.delay_ms(step);
            self.soft_off_elapsed_ms = self.soft_off_elapsed_ms.saturating_add(step);
            return Ok(());
        }

        warn!("Host no longer running, powering off");
        self.set_psu_enable(false)?;
        self.disarm_soft_off_detection();
        self.button_held = false;
        self.state = SystemState::Off;
        self.last_state = SystemState::Off;
        self.listener.power_off();
        Ok(())
    }
}
