//! Error types for desklink-core.
//!
//! This module defines the error surface of the crate. Errors only appear at
//! API boundaries (starting a source, validating configuration); steady-state
//! event processing reports trouble through logging and status values instead,
//! so a failed advertisement or a flaky GATT service never propagates a panic
//! or an `Err` into callers.
//!
//! # Where each variant shows up
//!
//! | Error Type | Surface |
//! |------------|---------|
//! | [`Error::Bluetooth`] | Adapter and peripheral calls through btleplug |
//! | [`Error::NoAdapter`] | [`crate::scanner::get_adapter`] on a machine without BLE |
//! | [`Error::InvalidArgument`] | Configuration setters, e.g. a zero expiry period |
//! | [`Error::Transport`] | Non-btleplug advertisement/GATT backends and mocks |

use thiserror::Error;

/// Errors that can occur when discovering or enumerating desk peripherals.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Bluetooth Low Energy error.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// No Bluetooth adapter available on this machine.
    #[error("no Bluetooth adapter available")]
    NoAdapter,

    /// An argument violated a value-range contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An advertisement or GATT transport failed outside btleplug.
    #[error("transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

/// Result type alias using desklink-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
