//! Core BLE discovery and GATT caching library for DeskLink desk peripherals.
//!
//! This crate discovers nearby desk peripherals from their broadcast
//! advertisements, keeps a live registry of what has been seen, evicts
//! devices that fall silent, and — once a peripheral is connected — walks
//! its GATT service/characteristic hierarchy into a lookup table for the
//! read/write layer above.
//!
//! # Features
//!
//! - **Device discovery**: Classify advertisements into discovered / updated
//!   / name-resolved event streams backed by a thread-safe registry
//! - **Expiry**: Periodic eviction of devices that stop advertising, with a
//!   configurable timeout
//! - **GATT enumeration**: Refresh a service/characteristic cache from a
//!   connected peripheral, tolerating per-service failures
//! - **Swappable transport**: Everything runs against trait boundaries, with
//!   a btleplug backend for hardware and scripted mocks for tests
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use desklink_core::{BleScanner, DeviceRegistry, DiscoveryMonitor, ExpiryMonitor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scanner = Arc::new(BleScanner::new().await?);
//!     let registry = Arc::new(DeviceRegistry::new());
//!     let monitor = ExpiryMonitor::new(DiscoveryMonitor::new(scanner, registry));
//!
//!     let mut discovered = monitor.discovered();
//!     let mut expired = monitor.expired();
//!     monitor.start_listening().await?;
//!
//!     tokio::select! {
//!         Ok(device) = discovered.recv() => {
//!             println!("found {} ({:?})", device.mac_address(), device.name());
//!         }
//!         Ok(device) = expired.recv() => {
//!             println!("lost {}", device.mac_address());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod error;
pub mod events;
pub mod expiry;
pub mod gatt;
pub mod mock;
pub mod monitor;
pub mod registry;
pub mod scanner;
pub mod source;

pub use device::Device;
pub use error::{Error, Result};
pub use events::{EventChannel, EventReceiver};
pub use expiry::{DEFAULT_TIMEOUT, ExpiryMonitor};
pub use gatt::{
    BleGattSession, CacheView, GattEnumerator, GattServiceHandle, GattSession, ServiceCache,
};
pub use monitor::{DiscoveryMonitor, DiscoveryOptions};
pub use registry::DeviceRegistry;
pub use scanner::{BleScanner, get_adapter};
pub use source::{Advertisement, AdvertisementSource, AdvertisementStream};

// Re-export the vocabulary crate so downstream code needs one dependency.
pub use desklink_types::{BtAddress, CommunicationStatus, ConnectionStatus};
