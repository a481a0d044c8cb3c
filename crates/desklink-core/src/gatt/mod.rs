//! GATT service enumeration and caching.
//!
//! Once a peripheral connection exists, the types in this module walk its
//! service/characteristic hierarchy and keep the result in a lookup table
//! for the read/write layer above:
//!
//! - [`session::GattSession`] and friends — the trait boundary between the
//!   pipeline and whatever transport provides GATT (btleplug via
//!   [`ble::BleGattSession`], or [`crate::mock::MockGattSession`] in tests).
//! - [`cache::ServiceCache`] — owns the enumerated handles and releases
//!   superseded ones deterministically.
//! - [`enumerate::GattEnumerator`] — the refresh pipeline that fills the
//!   cache and reports one terminal [`CommunicationStatus`] per refresh.
//!
//! [`CommunicationStatus`]: desklink_types::CommunicationStatus

pub mod ble;
pub mod cache;
pub mod enumerate;
pub mod session;

pub use ble::{BleGattCharacteristic, BleGattService, BleGattSession};
pub use cache::{CacheView, ServiceCache, ServiceEntry};
pub use enumerate::GattEnumerator;
pub use session::{
    CharacteristicEnumeration, GattCharacteristicHandle, GattServiceHandle, GattSession,
    ServiceEnumeration,
};
