//! ATX power management for a single-board computer.
//!
//! The library holds everything that can run on the host: the power
//! supervisor and its soft-off detector, the power-button tracker, the
//! status-LED policy, and the compile-time configuration.  All hardware
//! access goes through `embedded-hal` 1.0 traits.
//!
//! Usage: `cargo test` runs the whole suite on the host.
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and needs the `embedded` feature.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod button;
pub mod config;
pub mod error;
pub mod indicator;
pub mod supervisor;

pub use button::{ButtonEvent, ButtonTracker, PowerButton};
pub use error::Error;
pub use indicator::PowerLed;
pub use supervisor::{
    Callbacks, Pins, PowerListener, Supervisor, SupervisorConfig, SystemState,
};
