//! Trait boundary for GATT sessions, services, and characteristics.
//!
//! The enumeration pipeline is written against these traits so it runs
//! identically over a live btleplug peripheral and over scripted mocks.
//! Handle disposal is `Drop`; any native resource a handle wraps is
//! released when the handle goes out of scope.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use desklink_types::{CommunicationStatus, ConnectionStatus};

/// Outcome of asking a session for its services.
#[derive(Debug)]
pub struct ServiceEnumeration<S> {
    /// Overall status of the exchange.
    pub status: CommunicationStatus,
    /// ATT error code accompanying [`CommunicationStatus::ProtocolError`].
    pub protocol_error: Option<u8>,
    /// Discovered service handles. Empty unless `status` is success.
    pub services: Vec<S>,
}

impl<S> ServiceEnumeration<S> {
    /// A successful enumeration carrying these services.
    #[must_use]
    pub fn success(services: Vec<S>) -> Self {
        Self {
            status: CommunicationStatus::Success,
            protocol_error: None,
            services,
        }
    }

    /// A failed enumeration carrying no services.
    #[must_use]
    pub fn failed(status: CommunicationStatus) -> Self {
        Self {
            status,
            protocol_error: None,
            services: Vec::new(),
        }
    }

    /// A protocol-error enumeration carrying the ATT error code.
    #[must_use]
    pub fn protocol_error(code: u8) -> Self {
        Self {
            status: CommunicationStatus::ProtocolError,
            protocol_error: Some(code),
            services: Vec::new(),
        }
    }
}

/// Outcome of asking a service for its characteristics.
#[derive(Debug)]
pub struct CharacteristicEnumeration<C> {
    /// Overall status of the exchange.
    pub status: CommunicationStatus,
    /// ATT error code accompanying [`CommunicationStatus::ProtocolError`].
    pub protocol_error: Option<u8>,
    /// Discovered characteristic handles. Empty unless `status` is success.
    pub characteristics: Vec<C>,
}

impl<C> CharacteristicEnumeration<C> {
    /// A successful enumeration carrying these characteristics.
    #[must_use]
    pub fn success(characteristics: Vec<C>) -> Self {
        Self {
            status: CommunicationStatus::Success,
            protocol_error: None,
            characteristics,
        }
    }

    /// A failed enumeration carrying no characteristics.
    #[must_use]
    pub fn failed(status: CommunicationStatus) -> Self {
        Self {
            status,
            protocol_error: None,
            characteristics: Vec::new(),
        }
    }

    /// A protocol-error enumeration carrying the ATT error code.
    #[must_use]
    pub fn protocol_error(code: u8) -> Self {
        Self {
            status: CommunicationStatus::ProtocolError,
            protocol_error: Some(code),
            characteristics: Vec::new(),
        }
    }
}

/// An established link to one peripheral, as seen by GATT enumeration.
#[async_trait]
pub trait GattSession: Send + Sync {
    /// Service handle type produced by this session.
    type Service: GattServiceHandle;

    /// Current link state.
    ///
    /// Never fails: a link whose state cannot be verified counts as
    /// disconnected.
    async fn connection_status(&self) -> ConnectionStatus;

    /// Enumerate the services offered by the peripheral.
    ///
    /// An `Err` means the transport broke down; a non-success
    /// [`ServiceEnumeration::status`] means the peripheral answered but
    /// refused or failed the request.
    async fn discover_services(&self) -> Result<ServiceEnumeration<Self::Service>>;
}

/// One GATT service on a peripheral.
#[async_trait]
pub trait GattServiceHandle: Send + Sync + 'static {
    /// Characteristic handle type produced by this service.
    type Characteristic: GattCharacteristicHandle;

    /// UUID identifying the service.
    fn uuid(&self) -> Uuid;

    /// Enumerate the characteristics of this service.
    async fn discover_characteristics(
        &self,
    ) -> Result<CharacteristicEnumeration<Self::Characteristic>>;
}

/// One GATT characteristic within a service.
pub trait GattCharacteristicHandle: std::fmt::Debug + Send + Sync + 'static {
    /// UUID identifying the characteristic.
    fn uuid(&self) -> Uuid;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_constructors() {
        let ok: ServiceEnumeration<()> = ServiceEnumeration::success(vec![(), ()]);
        assert!(ok.status.is_success());
        assert_eq!(ok.services.len(), 2);
        assert_eq!(ok.protocol_error, None);

        let unreachable: CharacteristicEnumeration<()> =
            CharacteristicEnumeration::failed(CommunicationStatus::Unreachable);
        assert_eq!(unreachable.status, CommunicationStatus::Unreachable);
        assert!(unreachable.characteristics.is_empty());

        let protocol: ServiceEnumeration<()> = ServiceEnumeration::protocol_error(0x05);
        assert_eq!(protocol.status, CommunicationStatus::ProtocolError);
        assert_eq!(protocol.protocol_error, Some(0x05));
    }
}
