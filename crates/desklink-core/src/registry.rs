//! Thread-safe registry of peripherals observed on the air.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Mutex;

use tracing::debug;

use crate::device::Device;
use desklink_types::BtAddress;

/// Live map of hardware address to last-known device snapshot.
///
/// The registry stores owned copies of everything it is given and hands out
/// owned copies of everything it returns, so callers never share mutable
/// state with it. All operations are synchronous and internally serialized
/// by one mutex; none of them can fail.
///
/// Update policy on a known address: the name is only written while the
/// stored snapshot has none (the first advertised name wins permanently),
/// while signal strength and broadcast time always track the most recent
/// advertisement.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Mutex<HashMap<BtAddress, Device>>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new device or fold an observation into a known one.
    pub fn add_or_update(&self, device: &Device) {
        let mut devices = self.lock();
        match devices.entry(device.address()) {
            Entry::Vacant(slot) => {
                debug!(
                    "Added device {} (name {:?}, rssi {})",
                    device.mac_address(),
                    device.name(),
                    device.rssi()
                );
                slot.insert(device.clone());
            }
            Entry::Occupied(mut slot) => {
                slot.get_mut().absorb(device);
                debug!(
                    "Updated device {} (name {:?}, rssi {})",
                    device.mac_address(),
                    slot.get().name(),
                    device.rssi()
                );
            }
        }
    }

    /// Remove a device by its address. Removing an unknown device is a no-op.
    pub fn remove(&self, device: &Device) {
        if self.lock().remove(&device.address()).is_some() {
            debug!("Removed device {}", device.mac_address());
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut devices = self.lock();
        let count = devices.len();
        devices.clear();
        debug!("Cleared registry ({count} devices)");
    }

    /// Whether a device with the same address is currently registered.
    #[must_use]
    pub fn contains(&self, device: &Device) -> bool {
        self.lock().contains_key(&device.address())
    }

    /// Fetch a copy of the snapshot stored under `address`.
    #[must_use]
    pub fn get(&self, address: BtAddress) -> Option<Device> {
        self.lock().get(&address).cloned()
    }

    /// Owned copies of every registered device, ordered by address.
    ///
    /// The returned vector is decoupled from the registry: concurrent
    /// mutation never invalidates iteration over it.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Device> {
        let mut devices: Vec<Device> = self.lock().values().cloned().collect();
        devices.sort_by_key(Device::address);
        devices
    }

    /// Number of registered devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no devices are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<BtAddress, Device>> {
        self.devices.lock().expect("device registry mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn device(address: u64, name: Option<&str>, rssi: i16) -> Device {
        Device::new(
            BtAddress::new(address),
            name.map(str::to_owned),
            rssi,
            Instant::now(),
        )
    }

    #[test]
    fn test_add_then_get() {
        let registry = DeviceRegistry::new();
        let d = device(1, Some("Desk"), -60);

        registry.add_or_update(&d);

        assert!(registry.contains(&d));
        assert_eq!(registry.get(d.address()), Some(d));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_unknown_address() {
        let registry = DeviceRegistry::new();
        assert_eq!(registry.get(BtAddress::new(99)), None);
    }

    #[test]
    fn test_repeated_add_keeps_single_entry() {
        let registry = DeviceRegistry::new();
        let d = device(1, Some("Desk"), -60);

        registry.add_or_update(&d);
        registry.add_or_update(&d);
        registry.add_or_update(&d);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(d.address()), Some(d));
    }

    #[test]
    fn test_first_name_wins() {
        let registry = DeviceRegistry::new();
        registry.add_or_update(&device(1, None, -60));
        registry.add_or_update(&device(1, Some("Desk"), -55));
        registry.add_or_update(&device(1, Some("Other"), -50));

        let stored = registry.get(BtAddress::new(1)).unwrap();
        assert_eq!(stored.name(), Some("Desk"));
        assert_eq!(stored.rssi(), -50);
    }

    #[test]
    fn test_empty_name_does_not_claim_the_slot() {
        let registry = DeviceRegistry::new();
        registry.add_or_update(&device(1, Some(""), -60));
        registry.add_or_update(&device(1, Some("Desk"), -55));

        let stored = registry.get(BtAddress::new(1)).unwrap();
        assert_eq!(stored.name(), Some("Desk"));
    }

    #[test]
    fn test_remove_is_noop_for_unknown_device() {
        let registry = DeviceRegistry::new();
        registry.add_or_update(&device(1, None, -60));

        registry.remove(&device(2, None, -50));
        assert_eq!(registry.len(), 1);

        registry.remove(&device(1, None, -60));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clear_empties_the_registry() {
        let registry = DeviceRegistry::new();
        registry.add_or_update(&device(1, None, -60));
        registry.add_or_update(&device(2, None, -61));

        registry.clear();

        assert!(registry.is_empty());
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn test_snapshot_is_ordered_and_decoupled() {
        let registry = DeviceRegistry::new();
        registry.add_or_update(&device(3, None, -60));
        registry.add_or_update(&device(1, None, -61));
        registry.add_or_update(&device(2, None, -62));

        let snapshot = registry.snapshot();
        let addresses: Vec<u64> = snapshot.iter().map(|d| d.address().as_u64()).collect();
        assert_eq!(addresses, vec![1, 2, 3]);

        // Mutating the registry leaves the snapshot untouched.
        registry.clear();
        assert_eq!(snapshot.len(), 3);
    }

    #[test]
    fn test_concurrent_updates_from_many_threads() {
        use std::sync::Arc;

        let registry = Arc::new(DeviceRegistry::new());
        let mut handles = Vec::new();

        for thread in 0..8u64 {
            let registry = Arc::clone(&registry);
            handles.push(std::thread::spawn(move || {
                for i in 0..100u64 {
                    registry.add_or_update(&device(i % 10, None, -(thread as i16)));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.len(), 10);
    }
}
