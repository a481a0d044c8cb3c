//! btleplug-backed GATT session.
//!
//! Wraps a connected [`Peripheral`] behind the [`GattSession`] traits so the
//! enumeration pipeline can walk its services and characteristics. The
//! platform owns the actual attribute records; these handles release their
//! clones on drop.

use async_trait::async_trait;
use btleplug::api::{Central, Characteristic, Peripheral as _, Service};
use btleplug::platform::{Adapter, Peripheral};
use tracing::{debug, info};
use uuid::Uuid;

use crate::gatt::session::{
    CharacteristicEnumeration, GattCharacteristicHandle, GattServiceHandle, GattSession,
    ServiceEnumeration,
};
use crate::error::{Error, Result};
use desklink_types::{BtAddress, ConnectionStatus};

/// GATT session over a btleplug peripheral.
#[derive(Debug, Clone)]
pub struct BleGattSession {
    peripheral: Peripheral,
}

impl BleGattSession {
    /// Wrap an already-obtained peripheral.
    #[must_use]
    pub fn new(peripheral: Peripheral) -> Self {
        Self { peripheral }
    }

    /// Find a peripheral by hardware address among the adapter's known
    /// peripherals.
    ///
    /// The adapter only knows peripherals it has seen advertise, so run a
    /// scan first (see [`crate::scanner::BleScanner`]).
    pub async fn find(adapter: &Adapter, address: BtAddress) -> Result<Self> {
        for peripheral in adapter.peripherals().await? {
            if let Ok(Some(properties)) = peripheral.properties().await
                && BtAddress::from_octets(properties.address.into_inner()) == address
            {
                debug!("Matched peripheral by address {}", address);
                return Ok(Self::new(peripheral));
            }
        }
        Err(Error::transport(format!(
            "no known peripheral with address {address}"
        )))
    }

    /// Establish the link. No-op if already connected.
    pub async fn connect(&self) -> Result<()> {
        if !self.peripheral.is_connected().await.unwrap_or(false) {
            self.peripheral.connect().await?;
            info!("Connected to peripheral");
        }
        Ok(())
    }

    /// Tear the link down. No-op if already disconnected.
    pub async fn disconnect(&self) -> Result<()> {
        if self.peripheral.is_connected().await.unwrap_or(false) {
            self.peripheral.disconnect().await?;
            info!("Disconnected from peripheral");
        }
        Ok(())
    }

    /// The wrapped peripheral, for the read/write layer above.
    #[must_use]
    pub fn peripheral(&self) -> &Peripheral {
        &self.peripheral
    }
}

#[async_trait]
impl GattSession for BleGattSession {
    type Service = BleGattService;

    async fn connection_status(&self) -> ConnectionStatus {
        // A link whose state cannot be verified counts as disconnected.
        if self.peripheral.is_connected().await.unwrap_or(false) {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }

    async fn discover_services(&self) -> Result<ServiceEnumeration<BleGattService>> {
        self.peripheral.discover_services().await?;
        let services = self
            .peripheral
            .services()
            .into_iter()
            .map(BleGattService::new)
            .collect();
        Ok(ServiceEnumeration::success(services))
    }
}

/// One GATT service record held by a [`BleGattSession`].
#[derive(Debug, Clone)]
pub struct BleGattService {
    service: Service,
}

impl BleGattService {
    fn new(service: Service) -> Self {
        Self { service }
    }

    /// The wrapped service record.
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }
}

#[async_trait]
impl GattServiceHandle for BleGattService {
    type Characteristic = BleGattCharacteristic;

    fn uuid(&self) -> Uuid {
        self.service.uuid
    }

    async fn discover_characteristics(
        &self,
    ) -> Result<CharacteristicEnumeration<BleGattCharacteristic>> {
        // btleplug resolves characteristics during service discovery and
        // embeds them in the service record.
        let characteristics = self
            .service
            .characteristics
            .iter()
            .cloned()
            .map(BleGattCharacteristic::new)
            .collect();
        Ok(CharacteristicEnumeration::success(characteristics))
    }
}

/// One GATT characteristic record, usable with the peripheral's read/write
/// calls.
#[derive(Debug, Clone)]
pub struct BleGattCharacteristic {
    characteristic: Characteristic,
}

impl BleGattCharacteristic {
    fn new(characteristic: Characteristic) -> Self {
        Self { characteristic }
    }

    /// The wrapped characteristic record.
    #[must_use]
    pub fn characteristic(&self) -> &Characteristic {
        &self.characteristic
    }
}

impl GattCharacteristicHandle for BleGattCharacteristic {
    fn uuid(&self) -> Uuid {
        self.characteristic.uuid
    }
}
