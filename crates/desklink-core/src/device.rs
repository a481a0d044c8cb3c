//! Snapshot model of an observed desk peripheral.

use tokio::time::Instant;

use desklink_types::BtAddress;

/// Last-known state of one peripheral, as assembled from its advertisements.
///
/// A `Device` is a value, not a handle: the registry stores owned copies and
/// hands out owned copies, so holding one never blocks or observes later
/// mutation. The address is the identity and never changes; the MAC rendering
/// is derived from it once at construction. The name is sticky: it can only
/// transition from unknown to a concrete value, after which later
/// advertisements cannot rename the device. Signal strength and broadcast
/// time always reflect the most recent advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    address: BtAddress,
    mac_address: String,
    name: Option<String>,
    rssi: i16,
    broadcast_time: Instant,
}

impl Device {
    /// Creates a device snapshot from one observation.
    ///
    /// An empty `name` means the advertisement carried no usable name and is
    /// stored as unknown.
    #[must_use]
    pub fn new(address: BtAddress, name: Option<String>, rssi: i16, broadcast_time: Instant) -> Self {
        Self {
            address,
            mac_address: address.to_string(),
            name: name.filter(|n| !n.is_empty()),
            rssi,
            broadcast_time,
        }
    }

    /// Hardware address, the immutable identity of the device.
    #[must_use]
    pub fn address(&self) -> BtAddress {
        self.address
    }

    /// MAC-style rendering of the address, e.g. `"E7:A1:F7:84:2F:17"`.
    #[must_use]
    pub fn mac_address(&self) -> &str {
        &self.mac_address
    }

    /// Advertised name, if one has been observed. Never empty.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Raw signal strength of the most recent advertisement, in dBm.
    #[must_use]
    pub fn rssi(&self) -> i16 {
        self.rssi
    }

    /// Monotonic instant at which the most recent advertisement arrived.
    #[must_use]
    pub fn broadcast_time(&self) -> Instant {
        self.broadcast_time
    }

    /// Folds a newer observation of the same device into this snapshot.
    ///
    /// The name is only taken while still unknown; signal strength and
    /// broadcast time are always taken. The address is left untouched.
    pub(crate) fn absorb(&mut self, newer: &Self) {
        if self.name.is_none() && newer.name.is_some() {
            self.name = newer.name.clone();
        }
        self.rssi = newer.rssi;
        self.broadcast_time = newer.broadcast_time;
    }
}
