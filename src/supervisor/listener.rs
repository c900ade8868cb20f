//! Outward power notifications.

/// Receives the supervisor's state-entry notifications.
///
/// Every method defaults to a no-op, so an implementation only overrides
/// the notifications it cares about.  `()` is the "no listener" value.
pub trait PowerListener {
    /// The PSU reported power-good; the host is presumed running.
    fn power_on(&mut self) {}

    /// Power was lost or cut.
    fn power_off(&mut self) {}

    /// The PSU was enabled but the host is not ready yet.
    fn power_init(&mut self) {}
}

impl PowerListener for () {}

impl<T: PowerListener + ?Sized> PowerListener for &mut T {
    fn power_on(&mut self) {
        (**self).power_on()
    }

    fn power_off(&mut self) {
        (**self).power_off()
    }

    fn power_init(&mut self) {
        (**self).power_init()
    }
}

/// Plain function handlers, at most one per notification kind.
///
/// An unregistered handler is simply skipped.
#[derive(Clone, Copy, Debug, Default)]
pub struct Callbacks {
    on_power_on: Option<fn()>,
    on_power_off: Option<fn()>,
    on_power_init: Option<fn()>,
}

impl Callbacks {
    /// No handlers registered.
    pub const fn new() -> Self {
        Self {
            on_power_on: None,
            on_power_off: None,
            on_power_init: None,
        }
    }

    pub const fn on_power_on(mut self, handler: fn()) -> Self {
        self.on_power_on = Some(handler);
        self
    }

    pub const fn on_power_off(mut self, handler: fn()) -> Self {
        self.on_power_off = Some(handler);
        self
    }

    pub const fn on_power_init(mut self, handler: fn()) -> Self {
        self.on_power_init = Some(handler);
        self
    }
}

impl PowerListener for Callbacks {
    fn power_on(&mut self) {
        if let Some(handler) = self.on_power_on {
            handler();
        }
    }

    fn power_off(&mut self) {
        if let Some(handler) = self.on_power_off {
            handler();
        }
    }

    fn power_init(&mut self) {
        if let Some(handler) = self.on_power_init {
            handler();
        }
    }
}
