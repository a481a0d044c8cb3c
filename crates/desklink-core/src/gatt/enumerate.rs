//! GATT enumeration pipeline.
//!
//! [`GattEnumerator::refresh`] rebuilds a [`ServiceCache`] from a connected
//! session: it clears the stale table, enumerates services, then enumerates
//! each service's characteristics, and finishes with exactly one terminal
//! status on the `refreshed` channel. A service that cannot be enumerated is
//! logged and skipped; only transport-level trouble (disconnected link, the
//! service-list call itself failing) aborts the whole refresh.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::events::{EventChannel, EventReceiver};
use crate::gatt::cache::ServiceCache;
use crate::gatt::session::{GattServiceHandle, GattSession};
use desklink_types::CommunicationStatus;

/// Fills a [`ServiceCache`] by enumerating a peripheral's GATT hierarchy.
pub struct GattEnumerator<S: GattSession> {
    session: Arc<S>,
    cache: Arc<ServiceCache<S::Service>>,
    refreshed: EventChannel<CommunicationStatus>,
}

impl<S: GattSession> GattEnumerator<S> {
    /// Create an enumerator with its own empty cache.
    #[must_use]
    pub fn new(session: Arc<S>) -> Self {
        Self::with_cache(session, Arc::new(ServiceCache::new()))
    }

    /// Create an enumerator filling a shared cache.
    #[must_use]
    pub fn with_cache(session: Arc<S>, cache: Arc<ServiceCache<S::Service>>) -> Self {
        Self {
            session,
            cache,
            refreshed: EventChannel::default(),
        }
    }

    /// The cache this enumerator fills.
    #[must_use]
    pub fn cache(&self) -> Arc<ServiceCache<S::Service>> {
        Arc::clone(&self.cache)
    }

    /// Subscribe to the terminal status of each refresh.
    pub fn refreshed(&self) -> EventReceiver<CommunicationStatus> {
        self.refreshed.subscribe()
    }

    /// Rebuild the cache from the peripheral.
    ///
    /// Always publishes exactly one status on the `refreshed` channel, which
    /// is also returned. The cache is cleared up front, so a refresh that
    /// fails leaves no stale entries behind.
    pub async fn refresh(&self) -> CommunicationStatus {
        self.cache.clear();

        if !self.session.connection_status().await.is_connected() {
            warn!("Refresh skipped: peripheral is disconnected");
            return self.finish(CommunicationStatus::Unreachable);
        }

        let enumeration = match self.session.discover_services().await {
            Ok(enumeration) => enumeration,
            Err(e) => {
                warn!("Service enumeration failed: {}", e);
                return self.finish(CommunicationStatus::Unreachable);
            }
        };
        if !enumeration.status.is_success() {
            warn!(
                "Service enumeration answered {} (ATT error {:?})",
                enumeration.status, enumeration.protocol_error
            );
            return self.finish(enumeration.status);
        }

        for service in enumeration.services {
            let uuid = service.uuid();
            match service.discover_characteristics().await {
                Ok(result) if result.status.is_success() => {
                    debug!(
                        "Cached service {} ({} characteristics)",
                        uuid,
                        result.characteristics.len()
                    );
                    self.cache.insert(service, result);
                }
                Ok(result) => {
                    warn!(
                        "Skipping service {}: {} (ATT error {:?})",
                        uuid, result.status, result.protocol_error
                    );
                }
                Err(e) => {
                    warn!("Skipping service {}: {}", uuid, e);
                }
            }
        }

        self.finish(CommunicationStatus::Success)
    }

    fn finish(&self, status: CommunicationStatus) -> CommunicationStatus {
        self.refreshed.send(status);
        status
    }
}
