//! Typed errors for the library. Binaries wrap these in `anyhow`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[cfg(feature = "hid")]
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),
    #[error("no matching Stream Deck found")]
    DeviceNotFound,
    #[error("unknown Stream Deck model '{0}'")]
    UnknownModel(String),
    #[error("report of {size} bytes exceeds the {max} byte feature report")]
    ReportTooLarge { size: usize, max: usize },
}

/// Rejected user input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("brightness is empty")]
    EmptyBrightness,
    #[error("invalid brightness '{0}', expected a whole number between 0 and 100")]
    InvalidBrightness(String),
    #[error("unknown action '{0}'")]
    UnknownAction(String),
}
