//! Cache of enumerated services and their characteristics.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;
use uuid::Uuid;

use crate::gatt::session::{CharacteristicEnumeration, GattServiceHandle};

/// A cached service handle together with its characteristic enumeration.
///
/// The entry owns both. Field order is drop order: when an entry is
/// superseded or the cache is cleared, the characteristic result is
/// released before the service handle that produced it.
#[derive(Debug)]
pub struct ServiceEntry<S: GattServiceHandle> {
    result: CharacteristicEnumeration<S::Characteristic>,
    service: S,
}

impl<S: GattServiceHandle> ServiceEntry<S> {
    /// The cached service handle.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// The characteristic handles enumerated from the service.
    pub fn characteristics(&self) -> &[S::Characteristic] {
        &self.result.characteristics
    }

    /// The full enumeration result, status and error code included.
    pub fn result(&self) -> &CharacteristicEnumeration<S::Characteristic> {
        &self.result
    }
}

/// Lookup table from service UUID to its cached enumeration.
///
/// The cache owns every handle it stores. Inserting over an existing UUID
/// releases the superseded entry before the replacement is installed;
/// clearing (or dropping the cache) releases every entry the same way.
/// All operations are synchronous and serialized by one mutex.
#[derive(Debug)]
pub struct ServiceCache<S: GattServiceHandle> {
    entries: Mutex<HashMap<Uuid, ServiceEntry<S>>>,
}

impl<S: GattServiceHandle> ServiceCache<S> {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store a service and its characteristic enumeration.
    ///
    /// A previously cached entry for the same service UUID is removed and
    /// released first.
    pub fn insert(&self, service: S, result: CharacteristicEnumeration<S::Characteristic>) {
        let mut entries = self.lock();
        let uuid = service.uuid();
        if let Some(superseded) = entries.remove(&uuid) {
            debug!("Releasing superseded cache entry for service {}", uuid);
            drop(superseded);
        }
        entries.insert(uuid, ServiceEntry { result, service });
    }

    /// Release every cached entry.
    pub fn clear(&self) {
        let mut entries = self.lock();
        let count = entries.len();
        entries.clear();
        if count > 0 {
            debug!("Cleared service cache ({count} services)");
        }
    }

    /// Number of cached services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no services.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Read-only view of the live table.
    ///
    /// The view holds the cache lock: mutation waits until it is dropped,
    /// so hold it only for the duration of a lookup.
    #[must_use]
    pub fn view(&self) -> CacheView<'_, S> {
        CacheView {
            entries: self.lock(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, ServiceEntry<S>>> {
        self.entries.lock().expect("service cache mutex poisoned")
    }
}

impl<S: GattServiceHandle> Default for ServiceCache<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only facade over the cache contents.
#[derive(Debug)]
pub struct CacheView<'a, S: GattServiceHandle> {
    entries: MutexGuard<'a, HashMap<Uuid, ServiceEntry<S>>>,
}

impl<S: GattServiceHandle> Deref for CacheView<'_, S> {
    type Target = HashMap<Uuid, ServiceEntry<S>>;

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockGattService, ReleaseEvent, ReleaseLog, ServiceBehavior};

    fn service(log: &ReleaseLog, uuid: u128) -> MockGattService {
        MockGattService::new(
            Uuid::from_u128(uuid),
            ServiceBehavior::characteristics(vec![]),
            log.clone(),
        )
    }

    async fn entry_for(
        service: &MockGattService,
    ) -> CharacteristicEnumeration<crate::mock::MockGattCharacteristic> {
        use crate::gatt::session::GattServiceHandle as _;
        service.discover_characteristics().await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_view() {
        let log = ReleaseLog::new();
        let cache = ServiceCache::new();

        let first = service(&log, 1);
        let result = entry_for(&first).await;
        cache.insert(first, result);

        assert_eq!(cache.len(), 1);
        let view = cache.view();
        let entry = view.get(&Uuid::from_u128(1)).unwrap();
        assert!(entry.result().status.is_success());
    }

    #[tokio::test]
    async fn test_replacing_entry_releases_the_superseded_one_first() {
        let log = ReleaseLog::new();
        let cache = ServiceCache::new();
        let uuid = Uuid::from_u128(7);
        let characteristic = Uuid::from_u128(70);

        let original = MockGattService::new(
            uuid,
            ServiceBehavior::characteristics(vec![characteristic]),
            log.clone(),
        );
        let result = entry_for(&original).await;
        cache.insert(original, result);
        assert!(log.events().is_empty());

        let replacement = service(&log, 7);
        let result = entry_for(&replacement).await;
        cache.insert(replacement, result);

        // The old entry went down result first, then its service handle.
        assert_eq!(
            log.events(),
            vec![
                ReleaseEvent::Characteristic(characteristic),
                ReleaseEvent::Service(uuid),
            ]
        );
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_releases_everything() {
        let log = ReleaseLog::new();
        let cache = ServiceCache::new();

        for id in 1..=3u128 {
            let svc = service(&log, id);
            let result = entry_for(&svc).await;
            cache.insert(svc, result);
        }
        assert_eq!(cache.len(), 3);

        cache.clear();

        assert!(cache.is_empty());
        let services_released = log
            .events()
            .iter()
            .filter(|event| matches!(event, ReleaseEvent::Service(_)))
            .count();
        assert_eq!(services_released, 3);
    }
}
