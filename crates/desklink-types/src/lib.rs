//! Platform-agnostic types for DeskLink BLE desk peripherals.
//!
//! This crate provides the shared vocabulary used by desklink-core and by
//! downstream consumers that only need to talk about devices without
//! linking a Bluetooth stack.
//!
//! # Features
//!
//! - 48-bit hardware addresses with MAC-style formatting and parsing
//! - Connection and GATT communication status enums
//! - Error types for address parsing
//!
//! # Example
//!
//! ```
//! use desklink_types::{BtAddress, CommunicationStatus};
//!
//! let address: BtAddress = "E7:A1:F7:84:2F:17".parse().unwrap();
//! assert_eq!(address.as_u64(), 0xE7A1_F784_2F17);
//! assert!(CommunicationStatus::Success.is_success());
//! ```

pub mod address;
pub mod error;
pub mod status;

pub use address::BtAddress;
pub use error::AddressParseError;
pub use status::{CommunicationStatus, ConnectionStatus};
