//! Application-wide constants and compile-time configuration.
//!
//! All timing parameters and signal polarities live here so they can be
//! tuned in one place.

use embedded_hal::digital::PinState;

/// Firmware version reported in the boot banner.
pub const FIRMWARE_VERSION: &str = "1.0";

// Button

/// How long the power button must be held before the PSU is forcibly
/// switched off (ms).
pub const POWER_OFF_HOLD_MS: u32 = 5000;

/// Interval at which the power button level is sampled (ms).
/// Contact bounce shorter than this never reaches the supervisor.
pub const BUTTON_POLL_INTERVAL_MS: u32 = 500;

// Supervisor timing

/// Pause after entering OFF before the next poll may run (ms).
pub const OFF_SETTLE_MS: u32 = 1000;

/// Soft-off must persist at least this long before power is cut (ms).
pub const SOFT_OFF_THRESHOLD_MS: u32 = 1500;

/// Confirmation step added to the soft-off timer on each poll (ms).
pub const SOFT_OFF_STEP_MS: u32 = 500;

/// Supervisor poll cadence in the firmware loop (ms).
pub const SUPERVISOR_POLL_MS: u64 = 20;

// Signal polarity

/// According to the ATX specification, PS_ON# must be pulled to ground to
/// switch the PSU on.
pub const PSU_ENABLE_ACTIVE_LEVEL: PinState = PinState::Low;

/// PWR_OK is driven high once the PSU rails are stable.
pub const POWER_GOOD_ACTIVE_LEVEL: PinState = PinState::High;

/// The host holds its soft-off line high while its OS is running.
pub const SOFT_OFF_SENSE_ACTIVE_LEVEL: PinState = PinState::High;

/// Front-panel button is active-low with the internal pull-up.
pub const BUTTON_ACTIVE_LEVEL: PinState = PinState::Low;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` pins are
// selected in `main.rs`.  Adjust for your custom PCB.
//
//   PS_ON#         → P0.03
//   Power button   → P0.04
//   Power LED      → P0.28
//   Soft-off sense → P0.29
//   PWR_OK         → P0.30
