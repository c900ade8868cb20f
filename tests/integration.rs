//! Integration tests for the atx-pmu public API.
//!
//! Drives a full power cycle the way the firmware does: button samples
//! through the tracker, events into the supervisor, then a poll.

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use atx_pmu::config::{BUTTON_POLL_INTERVAL_MS, POWER_OFF_HOLD_MS};
use atx_pmu::{
    ButtonEvent, ButtonTracker, Callbacks, Pins, PowerLed, Supervisor, SupervisorConfig,
    SystemState,
};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};

#[derive(Clone, Default)]
struct Wire(Rc<Cell<bool>>);

impl Wire {
    fn set(&self, high: bool) {
        self.0.set(high);
    }

    fn get(&self) -> bool {
        self.0.get()
    }
}

impl ErrorType for Wire {
    type Error = Infallible;
}

impl InputPin for Wire {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.get())
    }
}

impl OutputPin for Wire {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set(true);
        Ok(())
    }
}

impl StatefulOutputPin for Wire {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.get())
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.get())
    }
}

#[derive(Clone, Default)]
struct Clock(Rc<Cell<u64>>);

impl DelayNs for Clock {
    fn delay_ns(&mut self, ns: u32) {
        self.0.set(self.0.get() + u64::from(ns) / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.set(self.0.get() + u64::from(ms));
    }
}

thread_local! {
    static POWER_ON: Cell<u32> = const { Cell::new(0) };
    static POWER_OFF: Cell<u32> = const { Cell::new(0) };
    static LAST: Cell<SystemState> = const { Cell::new(SystemState::Off) };
}

fn on_power_on() {
    POWER_ON.with(|c| c.set(c.get() + 1));
    LAST.with(|s| s.set(SystemState::On));
}

fn on_power_off() {
    POWER_OFF.with(|c| c.set(c.get() + 1));
    LAST.with(|s| s.set(SystemState::Off));
}

fn fired() -> (u32, u32) {
    (POWER_ON.with(Cell::get), POWER_OFF.with(Cell::get))
}

struct Board {
    ps_on: Wire,
    power_good: Wire,
    soft_off: Wire,
    clock: Clock,
    sup: Supervisor<Wire, Wire, Wire, Clock, Callbacks>,
}

impl Board {
    fn new() -> Self {
        let ps_on = Wire::default();
        let power_good = Wire::default();
        let soft_off = Wire::default();
        let clock = Clock::default();
        let callbacks = Callbacks::new()
            .on_power_on(on_power_on)
            .on_power_off(on_power_off);
        let mut sup = Supervisor::new(
            Pins {
                psu_enable: ps_on.clone(),
                power_good: power_good.clone(),
                soft_off_sense: soft_off.clone(),
            },
            clock.clone(),
            callbacks,
            SupervisorConfig::default(),
        );
        sup.initialize().expect("initialize");
        Self {
            ps_on,
            power_good,
            soft_off,
            clock,
            sup,
        }
    }

    /// PS_ON# is active-low.
    fn psu_on(&self) -> bool {
        !self.ps_on.get()
    }
}

#[test]
fn button_boot_then_soft_off_scenario() {
    let mut board = Board::new();
    assert_eq!(board.sup.state(), SystemState::Off);
    assert!(!board.psu_on());

    board.sup.handle_button(ButtonEvent::Pressed).unwrap();
    board.sup.handle_button(ButtonEvent::Released).unwrap();
    assert!(board.psu_on());
    assert_eq!(board.sup.state(), SystemState::Off);

    board.power_good.set(true);
    board.soft_off.set(true);
    board.sup.poll().unwrap();
    assert_eq!(board.sup.state(), SystemState::On);
    assert_eq!(fired(), (1, 0));

    // Host halts: three confirmation steps of 500 ms make up the 1500 ms
    // threshold, the poll after that cuts power.
    board.soft_off.set(false);
    for step in 1..=3u64 {
        board.sup.poll().unwrap();
        assert_eq!(board.sup.state(), SystemState::On, "step {}", step);
        assert_eq!(board.clock.0.get(), step * 500);
    }
    board.sup.poll().unwrap();
    assert_eq!(board.sup.state(), SystemState::Off);
    assert!(!board.psu_on());
    assert_eq!(fired(), (1, 1));
    assert_eq!(LAST.with(Cell::get), SystemState::Off);

    // Rails drop afterwards; no second notification.
    board.power_good.set(false);
    board.sup.poll().unwrap();
    board.sup.poll().unwrap();
    assert_eq!(fired(), (1, 1));
}

#[test]
fn long_press_forces_power_off() {
    let mut board = Board::new();
    let mut tracker = ButtonTracker::new(BUTTON_POLL_INTERVAL_MS, POWER_OFF_HOLD_MS);
    let mut now = 0u64;

    // Short press to power up.
    let mut feed = |board: &mut Board, pressed: bool, now: u64| {
        if let Some(event) = tracker.update(pressed, now) {
            board.sup.handle_button(event).unwrap();
        }
    };
    feed(&mut board, true, now);
    now += 500;
    feed(&mut board, false, now);
    assert!(board.psu_on());

    board.power_good.set(true);
    board.soft_off.set(true);
    board.sup.poll().unwrap();
    assert_eq!(board.sup.state(), SystemState::On);

    // Hold for the full threshold.
    now += 500;
    feed(&mut board, true, now);
    assert!(board.sup.is_button_held());
    while now < 1000 + u64::from(POWER_OFF_HOLD_MS) {
        now += 500;
        feed(&mut board, true, now);
    }
    assert!(!board.psu_on());
    assert_eq!(board.sup.state(), SystemState::On);

    board.power_good.set(false);
    board.sup.poll().unwrap();
    assert_eq!(board.sup.state(), SystemState::Off);
    assert!(!board.sup.is_soft_off_armed());

    // Letting go after the forced off does not restart the host.
    now += 500;
    feed(&mut board, false, now);
    assert!(!board.psu_on());
    assert_eq!(fired(), (1, 1));
}

#[test]
fn led_tracks_notified_state() {
    let wire = Wire::default();
    let mut led = PowerLed::new(wire.clone());
    assert!(!wire.get());

    let mut board = Board::new();
    board.sup.handle_button(ButtonEvent::Pressed).unwrap();
    board.sup.handle_button(ButtonEvent::Released).unwrap();
    board.power_good.set(true);
    board.sup.poll().unwrap();
    led.show(LAST.with(Cell::get));
    assert!(wire.get());

    board.power_good.set(false);
    board.sup.poll().unwrap();
    led.show(LAST.with(Cell::get));
    assert!(!wire.get());
}
