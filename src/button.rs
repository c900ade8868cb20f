//! Front-panel power button: sampling, debouncing and hold detection.
//!
//! The button is sampled at a fixed interval (500 ms by default); any
//! contact bounce between two samples is never seen.  A level change
//! between samples produces `Pressed` or `Released`, and a press that is
//! still down `hold_ms` after it began produces a single `Held`.

use embedded_hal::digital::{InputPin, PinState};

use crate::error::Error;

/// Debounced power-button notifications consumed by the supervisor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    /// Button went down.
    Pressed,
    /// Button came back up.
    Released,
    /// Button has been down for at least the hold threshold.
    Held,
}

/// Turns raw level samples into [`ButtonEvent`]s.
///
/// Pure logic: callers supply the pressed level and a millisecond
/// timestamp, so the tracker runs the same on target and in tests.
#[derive(Debug)]
pub struct ButtonTracker {
    interval_ms: u32,
    hold_ms: u32,
    last_sample_ms: Option<u64>,
    pressed: bool,
    pressed_at_ms: u64,
    hold_reported: bool,
}

impl ButtonTracker {
    pub const fn new(interval_ms: u32, hold_ms: u32) -> Self {
        Self {
            interval_ms,
            hold_ms,
            last_sample_ms: None,
            pressed: false,
            pressed_at_ms: 0,
            hold_reported: false,
        }
    }

    /// Whether the last accepted sample saw the button down.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Feed one level sample.
    ///
    /// Samples arriving sooner than `interval_ms` after the last accepted
    /// one are dropped.
    pub fn update(&mut self, pressed: bool, now_ms: u64) -> Option<ButtonEvent> {
        if let Some(last) = self.last_sample_ms {
            if now_ms.wrapping_sub(last) < u64::from(self.interval_ms) {
                return None;
            }
        }
        self.last_sample_ms = Some(now_ms);

        match (self.pressed, pressed) {
            (false, true) => {
                self.pressed = true;
                self.pressed_at_ms = now_ms;
                self.hold_reported = false;
                Some(ButtonEvent::Pressed)
            }
            (true, false) => {
                self.pressed = false;
                Some(ButtonEvent::Released)
            }
            (true, true)
                if !self.hold_reported
                    && now_ms.wrapping_sub(self.pressed_at_ms) >= u64::from(self.hold_ms) =>
            {
                self.hold_reported = true;
                Some(ButtonEvent::Held)
            }
            _ => None,
        }
    }
}

/// A [`ButtonTracker`] bound to its input pin.
pub struct PowerButton<P> {
    pin: P,
    active_level: PinState,
    tracker: ButtonTracker,
}

impl<P: InputPin> PowerButton<P> {
    pub fn new(pin: P, active_level: PinState, tracker: ButtonTracker) -> Self {
        Self {
            pin,
            active_level,
            tracker,
        }
    }

    /// Sample the pin and return the resulting event, if any.
    pub fn poll(&mut self, now_ms: u64) -> Result<Option<ButtonEvent>, Error> {
        let high = self.pin.is_high().map_err(|_| Error::Button)?;
        let pressed = high == (self.active_level == PinState::High);
        let event = self.tracker.update(pressed, now_ms);
        if let Some(event) = event {
            debug!("Button: {}", event);
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: u32 = 500;
    const HOLD: u32 = 5000;

    #[test]
    fn first_sample_released_is_silent() {
        let mut t = ButtonTracker::new(INTERVAL, HOLD);
        assert_eq!(t.update(false, 0), None);
        assert!(!t.is_pressed());
    }

    #[test]
    fn press_then_release() {
        let mut t = ButtonTracker::new(INTERVAL, HOLD);
        assert_eq!(t.update(false, 0), None);
        assert_eq!(t.update(true, 500), Some(ButtonEvent::Pressed));
        assert!(t.is_pressed());
        assert_eq!(t.update(true, 1000), None);
        assert_eq!(t.update(false, 1500), Some(ButtonEvent::Released));
        assert!(!t.is_pressed());
    }

    #[test]
    fn bounce_between_samples_is_ignored() {
        let mut t = ButtonTracker::new(INTERVAL, HOLD);
        assert_eq!(t.update(false, 0), None);
        // Contact chatter inside one sampling interval.
        assert_eq!(t.update(true, 10), None);
        assert_eq!(t.update(false, 20), None);
        assert_eq!(t.update(true, 30), None);
        assert_eq!(t.update(true, 500), Some(ButtonEvent::Pressed));
    }

    #[test]
    fn hold_fires_once_per_press() {
        let mut t = ButtonTracker::new(INTERVAL, HOLD);
        assert_eq!(t.update(true, 0), Some(ButtonEvent::Pressed));

        let mut now = 0;
        while now < 4500 {
            now += 500;
            assert_eq!(t.update(true, now), None, "no hold at {} ms", now);
        }
        assert_eq!(t.update(true, 5000), Some(ButtonEvent::Held));
        assert_eq!(t.update(true, 5500), None);
        assert_eq!(t.update(true, 9000), None);
        assert_eq!(t.update(false, 9500), Some(ButtonEvent::Released));

        // A new press starts a fresh hold window.
        assert_eq!(t.update(true, 10_000), Some(ButtonEvent::Pressed));
        assert_eq!(t.update(true, 15_000), Some(ButtonEvent::Held));
    }

    #[test]
    fn short_press_never_holds() {
        let mut t = ButtonTracker::new(INTERVAL, HOLD);
        assert_eq!(t.update(true, 0), Some(ButtonEvent::Pressed));
        assert_eq!(t.update(false, 4500), Some(ButtonEvent::Released));
        assert_eq!(t.update(false, 10_000), None);
    }

    #[test]
    fn timestamps_wrap() {
        let mut t = ButtonTracker::new(INTERVAL, HOLD);
        let start = u64::MAX - 100;
        assert_eq!(t.update(true, start), Some(ButtonEvent::Pressed));
        assert_eq!(t.update(true, start.wrapping_add(200)), None);
        assert_eq!(t.update(true, start.wrapping_add(5000)), Some(ButtonEvent::Held));
    }

    struct Level(bool);

    impl embedded_hal::digital::ErrorType for Level {
        type Error = core::convert::Infallible;
    }

    impl InputPin for Level {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.0)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.0)
        }
    }

    #[test]
    fn power_button_honours_active_low() {
        let mut button = PowerButton::new(
            Level(false),
            PinState::Low,
            ButtonTracker::new(INTERVAL, HOLD),
        );
        assert_eq!(button.poll(0), Ok(Some(ButtonEvent::Pressed)));

        button.pin.0 = true;
        assert_eq!(button.poll(500), Ok(Some(ButtonEvent::Released)));
    }
}
