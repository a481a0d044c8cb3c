//! Mock implementations for testing without BLE hardware.
//!
//! This module provides scripted stand-ins for both external boundaries:
//!
//! - [`MockAdvertisementSource`] implements
//!   [`AdvertisementSource`](crate::source::AdvertisementSource): tests push
//!   frames, inject stream failures, or complete the stream on demand.
//! - [`MockGattSession`] / [`MockGattService`] /
//!   [`MockGattCharacteristic`] implement the GATT session traits with
//!   per-service behavior injection, and record handle releases in a shared
//!   [`ReleaseLog`] so tests can assert resource release order.
//!
//! Everything here is exported so downstream crates can test their own code
//! against the same fakes.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::gatt::session::{
    CharacteristicEnumeration, GattCharacteristicHandle, GattServiceHandle, GattSession,
    ServiceEnumeration,
};
use crate::source::{Advertisement, AdvertisementSource, AdvertisementStream};
use desklink_types::{CommunicationStatus, ConnectionStatus};

// --- Advertisement side ---

type FrameSender = mpsc::UnboundedSender<Result<Advertisement>>;
type FrameReceiver = mpsc::UnboundedReceiver<Result<Advertisement>>;

/// A scripted advertisement source for testing.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use desklink_core::mock::MockAdvertisementSource;
/// use desklink_core::{Advertisement, DeviceRegistry, DiscoveryMonitor};
/// use desklink_types::BtAddress;
///
/// #[tokio::main]
/// async fn main() {
///     let source = Arc::new(MockAdvertisementSource::new());
///     let registry = Arc::new(DeviceRegistry::new());
///     let monitor = DiscoveryMonitor::new(source.clone(), registry);
///
///     let mut discovered = monitor.discovered();
///     monitor.start_listening().await.unwrap();
///
///     source.emit(Advertisement::new(BtAddress::new(1), Some("Desk".into()), -60));
///
///     let device = discovered.recv().await.unwrap();
///     assert_eq!(device.name(), Some("Desk"));
/// }
/// ```
#[derive(Debug)]
pub struct MockAdvertisementSource {
    sender: Mutex<Option<FrameSender>>,
    receiver: Mutex<Option<FrameReceiver>>,
    active: AtomicBool,
    start_failure: Mutex<Option<String>>,
}

impl MockAdvertisementSource {
    /// Create a source with an empty frame queue.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
            active: AtomicBool::new(false),
            start_failure: Mutex::new(None),
        }
    }

    /// Queue one frame for delivery. Ignored after [`complete`](Self::complete).
    pub fn emit(&self, frame: Advertisement) {
        if let Some(sender) = self.sender.lock().expect("mock sender mutex poisoned").as_ref() {
            let _ = sender.send(Ok(frame));
        }
    }

    /// Queue an upstream failure. The stream ends after delivering it.
    pub fn fail(&self, message: impl Into<String>) {
        if let Some(sender) = self.sender.lock().expect("mock sender mutex poisoned").as_ref() {
            let _ = sender.send(Err(Error::transport(message)));
        }
    }

    /// End the stream after all queued frames are delivered.
    pub fn complete(&self) {
        self.sender
            .lock()
            .expect("mock sender mutex poisoned")
            .take();
    }

    /// Make the next [`start`](AdvertisementSource::start) call fail.
    pub fn fail_next_start(&self, message: impl Into<String>) {
        *self
            .start_failure
            .lock()
            .expect("mock failure mutex poisoned") = Some(message.into());
    }

    /// Whether `start` has been called more recently than `stop`.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Default for MockAdvertisementSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdvertisementSource for MockAdvertisementSource {
    async fn start(&self) -> Result<AdvertisementStream> {
        if let Some(message) = self
            .start_failure
            .lock()
            .expect("mock failure mutex poisoned")
            .take()
        {
            return Err(Error::transport(message));
        }

        let receiver = {
            let mut slot = self.receiver.lock().expect("mock receiver mutex poisoned");
            match slot.take() {
                Some(receiver) => receiver,
                None => {
                    // Restarted after completion or a failure: wire up a
                    // fresh queue so emits reach the new stream.
                    let (sender, receiver) = mpsc::unbounded_channel();
                    *self.sender.lock().expect("mock sender mutex poisoned") = Some(sender);
                    receiver
                }
            }
        };

        self.active.store(true, Ordering::SeqCst);
        let stream = futures::stream::unfold(receiver, |mut receiver| async move {
            receiver.recv().await.map(|item| (item, receiver))
        });
        Ok(stream.boxed())
    }

    async fn stop(&self) -> Result<()> {
        self.active.store(false, Ordering::SeqCst);
        Ok(())
    }
}

// --- GATT side ---

/// One recorded handle release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseEvent {
    /// A characteristic handle was dropped.
    Characteristic(Uuid),
    /// A service handle was dropped.
    Service(Uuid),
}

/// Shared, ordered record of mock handle releases.
///
/// Clones share the same underlying log.
#[derive(Debug, Clone, Default)]
pub struct ReleaseLog {
    events: Arc<Mutex<Vec<ReleaseEvent>>>,
}

impl ReleaseLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the releases recorded so far, in release order.
    #[must_use]
    pub fn events(&self) -> Vec<ReleaseEvent> {
        self.events
            .lock()
            .expect("release log mutex poisoned")
            .clone()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.events
            .lock()
            .expect("release log mutex poisoned")
            .clear();
    }

    fn record(&self, event: ReleaseEvent) {
        self.events
            .lock()
            .expect("release log mutex poisoned")
            .push(event);
    }
}

/// What a [`MockGattService`] does when asked for its characteristics.
#[derive(Debug, Clone)]
pub enum ServiceBehavior {
    /// Succeed with characteristics of these UUIDs.
    Characteristics(Vec<Uuid>),
    /// Answer with a non-success status and optional ATT error code.
    Status(CommunicationStatus, Option<u8>),
    /// Fail the exchange outright.
    Failure(String),
}

impl ServiceBehavior {
    /// Succeed with characteristics of these UUIDs.
    #[must_use]
    pub fn characteristics(uuids: Vec<Uuid>) -> Self {
        Self::Characteristics(uuids)
    }

    /// Answer with a non-success status.
    #[must_use]
    pub fn status(status: CommunicationStatus) -> Self {
        Self::Status(status, None)
    }

    /// Answer with a protocol error carrying this ATT error code.
    #[must_use]
    pub fn protocol_error(code: u8) -> Self {
        Self::Status(CommunicationStatus::ProtocolError, Some(code))
    }

    /// Fail the exchange outright.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }
}

/// A mock GATT characteristic. Records its release in the shared log.
#[derive(Debug)]
pub struct MockGattCharacteristic {
    uuid: Uuid,
    log: ReleaseLog,
}

impl MockGattCharacteristic {
    /// Create a characteristic wired to a release log.
    #[must_use]
    pub fn new(uuid: Uuid, log: ReleaseLog) -> Self {
        Self { uuid, log }
    }
}

impl GattCharacteristicHandle for MockGattCharacteristic {
    fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl Drop for MockGattCharacteristic {
    fn drop(&mut self) {
        self.log.record(ReleaseEvent::Characteristic(self.uuid));
    }
}

/// A mock GATT service. Records its release in the shared log.
#[derive(Debug)]
pub struct MockGattService {
    uuid: Uuid,
    behavior: ServiceBehavior,
    log: ReleaseLog,
}

impl MockGattService {
    /// Create a service with the given characteristic behavior.
    #[must_use]
    pub fn new(uuid: Uuid, behavior: ServiceBehavior, log: ReleaseLog) -> Self {
        Self {
            uuid,
            behavior,
            log,
        }
    }
}

#[async_trait]
impl GattServiceHandle for MockGattService {
    type Characteristic = MockGattCharacteristic;

    fn uuid(&self) -> Uuid {
        self.uuid
    }

    async fn discover_characteristics(
        &self,
    ) -> Result<CharacteristicEnumeration<MockGattCharacteristic>> {
        match &self.behavior {
            ServiceBehavior::Characteristics(uuids) => {
                let characteristics = uuids
                    .iter()
                    .map(|&uuid| MockGattCharacteristic::new(uuid, self.log.clone()))
                    .collect();
                Ok(CharacteristicEnumeration::success(characteristics))
            }
            ServiceBehavior::Status(status, code) => Ok(CharacteristicEnumeration {
                status: *status,
                protocol_error: *code,
                characteristics: Vec::new(),
            }),
            ServiceBehavior::Failure(message) => Err(Error::transport(message.clone())),
        }
    }
}

impl Drop for MockGattService {
    fn drop(&mut self) {
        self.log.record(ReleaseEvent::Service(self.uuid));
    }
}

/// A mock GATT session with per-service behavior injection.
///
/// Built with [`MockGattSessionBuilder`]. Each
/// [`discover_services`](GattSession::discover_services) call manufactures
/// fresh service handles wired to the session's [`ReleaseLog`], so the
/// releases a test observes come from cache activity, not from the session's
/// own bookkeeping.
#[derive(Debug)]
pub struct MockGattSession {
    connection: Mutex<ConnectionStatus>,
    services: Vec<(Uuid, ServiceBehavior)>,
    services_failure: Mutex<Option<String>>,
    services_status: Mutex<Option<(CommunicationStatus, Option<u8>)>>,
    services_calls: AtomicU32,
    log: ReleaseLog,
}

impl MockGattSession {
    /// Start building a session. Defaults to connected with no services.
    #[must_use]
    pub fn builder() -> MockGattSessionBuilder {
        MockGattSessionBuilder::new()
    }

    /// Change the reported connection status.
    pub fn set_connection_status(&self, status: ConnectionStatus) {
        *self
            .connection
            .lock()
            .expect("mock connection mutex poisoned") = status;
    }

    /// Make the next `discover_services` call fail outright.
    pub fn fail_next_services(&self, message: impl Into<String>) {
        *self
            .services_failure
            .lock()
            .expect("mock failure mutex poisoned") = Some(message.into());
    }

    /// How many times `discover_services` has been called.
    #[must_use]
    pub fn services_call_count(&self) -> u32 {
        self.services_calls.load(Ordering::SeqCst)
    }

    /// The log that the session's handles record their releases in.
    #[must_use]
    pub fn release_log(&self) -> ReleaseLog {
        self.log.clone()
    }
}

#[async_trait]
impl GattSession for MockGattSession {
    type Service = MockGattService;

    async fn connection_status(&self) -> ConnectionStatus {
        *self
            .connection
            .lock()
            .expect("mock connection mutex poisoned")
    }

    async fn discover_services(&self) -> Result<ServiceEnumeration<MockGattService>> {
        self.services_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self
            .services_failure
            .lock()
            .expect("mock failure mutex poisoned")
            .take()
        {
            return Err(Error::transport(message));
        }

        if let Some((status, code)) = *self
            .services_status
            .lock()
            .expect("mock status mutex poisoned")
        {
            return Ok(ServiceEnumeration {
                status,
                protocol_error: code,
                services: Vec::new(),
            });
        }

        let services = self
            .services
            .iter()
            .map(|(uuid, behavior)| MockGattService::new(*uuid, behavior.clone(), self.log.clone()))
            .collect();
        Ok(ServiceEnumeration::success(services))
    }
}

/// Builder for creating mock GATT sessions with custom behavior.
#[derive(Debug, Default)]
pub struct MockGattSessionBuilder {
    disconnected: bool,
    services: Vec<(Uuid, ServiceBehavior)>,
    services_status: Option<(CommunicationStatus, Option<u8>)>,
}

impl MockGattSessionBuilder {
    /// Create a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the session disconnected.
    #[must_use]
    pub fn disconnected(mut self) -> Self {
        self.disconnected = true;
        self
    }

    /// Add a service and the behavior of its characteristic enumeration.
    #[must_use]
    pub fn service(mut self, uuid: Uuid, behavior: ServiceBehavior) -> Self {
        self.services.push((uuid, behavior));
        self
    }

    /// Make every `discover_services` call answer with this status
    /// instead of a service list.
    #[must_use]
    pub fn services_status(mut self, status: CommunicationStatus) -> Self {
        self.services_status = Some((status, None));
        self
    }

    /// Make every `discover_services` call answer with a protocol error
    /// carrying this ATT error code.
    #[must_use]
    pub fn services_protocol_error(mut self, code: u8) -> Self {
        self.services_status = Some((CommunicationStatus::ProtocolError, Some(code)));
        self
    }

    /// Build the session.
    #[must_use]
    pub fn build(self) -> MockGattSession {
        let connection = if self.disconnected {
            ConnectionStatus::Disconnected
        } else {
            ConnectionStatus::Connected
        };
        MockGattSession {
            connection: Mutex::new(connection),
            services: self.services,
            services_failure: Mutex::new(None),
            services_status: Mutex::new(self.services_status),
            services_calls: AtomicU32::new(0),
            log: ReleaseLog::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_source_delivers_frames_in_order() {
        use desklink_types::BtAddress;

        let source = MockAdvertisementSource::new();
        source.emit(Advertisement::new(BtAddress::new(1), None, -60));
        source.emit(Advertisement::new(BtAddress::new(2), None, -61));
        source.complete();

        let mut stream = source.start().await.unwrap();
        assert!(source.is_active());

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.address, BtAddress::new(1));
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.address, BtAddress::new(2));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_source_delivers_injected_failure() {
        let source = MockAdvertisementSource::new();
        source.fail("antenna fell off");

        let mut stream = source.start().await.unwrap();
        let item = stream.next().await.unwrap();
        assert!(matches!(item, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn test_source_start_failure_injection() {
        let source = MockAdvertisementSource::new();
        source.fail_next_start("adapter busy");

        assert!(source.start().await.is_err());
        // The failure is one-shot.
        assert!(source.start().await.is_ok());
    }

    #[tokio::test]
    async fn test_source_restart_after_completion() {
        use desklink_types::BtAddress;

        let source = MockAdvertisementSource::new();
        source.complete();
        let mut stream = source.start().await.unwrap();
        assert!(stream.next().await.is_none());

        let mut stream = source.start().await.unwrap();
        source.emit(Advertisement::new(BtAddress::new(9), None, -40));
        let frame = stream.next().await.unwrap().unwrap();
        assert_eq!(frame.address, BtAddress::new(9));
    }

    #[tokio::test]
    async fn test_session_builder_defaults() {
        let session = MockGattSession::builder().build();
        assert_eq!(
            session.connection_status().await,
            ConnectionStatus::Connected
        );
        assert_eq!(session.services_call_count(), 0);

        let enumeration = session.discover_services().await.unwrap();
        assert!(enumeration.status.is_success());
        assert!(enumeration.services.is_empty());
        assert_eq!(session.services_call_count(), 1);
    }

    #[tokio::test]
    async fn test_session_manufactures_services_per_call() {
        let uuid = Uuid::from_u128(5);
        let session = MockGattSession::builder()
            .service(uuid, ServiceBehavior::characteristics(vec![]))
            .build();

        let first = session.discover_services().await.unwrap();
        let second = session.discover_services().await.unwrap();
        assert_eq!(first.services.len(), 1);
        assert_eq!(second.services.len(), 1);
        assert_eq!(session.services_call_count(), 2);
    }

    #[tokio::test]
    async fn test_session_failure_injection_is_one_shot() {
        let session = MockGattSession::builder().build();
        session.fail_next_services("link reset");

        assert!(session.discover_services().await.is_err());
        assert!(session.discover_services().await.is_ok());
    }

    #[tokio::test]
    async fn test_service_behaviors() {
        let log = ReleaseLog::new();

        let ok = MockGattService::new(
            Uuid::from_u128(1),
            ServiceBehavior::characteristics(vec![Uuid::from_u128(10)]),
            log.clone(),
        );
        let result = ok.discover_characteristics().await.unwrap();
        assert!(result.status.is_success());
        assert_eq!(result.characteristics.len(), 1);

        let denied = MockGattService::new(
            Uuid::from_u128(2),
            ServiceBehavior::status(CommunicationStatus::AccessDenied),
            log.clone(),
        );
        let result = denied.discover_characteristics().await.unwrap();
        assert_eq!(result.status, CommunicationStatus::AccessDenied);

        let protocol = MockGattService::new(
            Uuid::from_u128(3),
            ServiceBehavior::protocol_error(0x0E),
            log.clone(),
        );
        let result = protocol.discover_characteristics().await.unwrap();
        assert_eq!(result.protocol_error, Some(0x0E));

        let broken = MockGattService::new(
            Uuid::from_u128(4),
            ServiceBehavior::failure("no response"),
            log.clone(),
        );
        assert!(broken.discover_characteristics().await.is_err());
    }

    #[test]
    fn test_release_log_records_drop_order() {
        let log = ReleaseLog::new();
        let service_uuid = Uuid::from_u128(1);
        let char_uuid = Uuid::from_u128(2);

        let characteristic = MockGattCharacteristic::new(char_uuid, log.clone());
        let service = MockGattService::new(
            service_uuid,
            ServiceBehavior::characteristics(vec![]),
            log.clone(),
        );
        drop(characteristic);
        drop(service);

        assert_eq!(
            log.events(),
            vec![
                ReleaseEvent::Characteristic(char_uuid),
                ReleaseEvent::Service(service_uuid),
            ]
        );

        log.clear();
        assert!(log.events().is_empty());
    }
}
