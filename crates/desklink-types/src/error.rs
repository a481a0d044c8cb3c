//! Error types for address parsing in desklink-types.

use thiserror::Error;

/// Errors that can occur when parsing a Bluetooth hardware address from text.
///
/// This error type is platform-agnostic and does not include
/// BLE-specific errors (those belong in desklink-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum AddressParseError {
    /// The input did not contain exactly 12 hexadecimal digits.
    #[error("expected 12 hexadecimal digits, found {0}")]
    InvalidLength(usize),
    /// The input contained a character that is not a hexadecimal digit
    /// or an octet separator.
    #[error("invalid character {0:?} in address")]
    InvalidCharacter(char),
}
