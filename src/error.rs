//! Error type for the power supervisor.
//!
//! Variants carry no data: they only name the signal whose pin driver
//! reported a fault.  Implements `defmt::Format` for on-target logging.

/// A digital I/O operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Writing or reading back the PSU-enable (PS_ON#) output failed.
    PsuEnable,

    /// Reading the power-good (PWR_OK) input failed.
    PowerGood,

    /// Reading the soft-off sense input failed.
    SoftOffSense,

    /// Reading the front-panel button input failed.
    Button,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let signal = match self {
            Error::PsuEnable => "PSU enable",
            Error::PowerGood => "power good",
            Error::SoftOffSense => "soft-off sense",
            Error::Button => "power button",
        };
        write!(f, "{} pin fault", signal)
    }
}
