//! btleplug-backed advertisement source.
//!
//! [`BleScanner`] turns the platform adapter's central events into the
//! [`Advertisement`] frames the discovery layer consumes. Each
//! `DeviceDiscovered`/`DeviceUpdated` event is resolved to its peripheral's
//! current properties; events for peripherals without an RSSI reading are
//! skipped rather than faked.

use async_trait::async_trait;
use btleplug::api::{BDAddr, Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use futures::StreamExt;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::source::{Advertisement, AdvertisementSource, AdvertisementStream};
use desklink_types::BtAddress;

/// Get the first available Bluetooth adapter.
pub async fn get_adapter() -> Result<Adapter> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;

    adapters.into_iter().next().ok_or(Error::NoAdapter)
}

/// Advertisement source backed by a btleplug adapter.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use desklink_core::{BleScanner, DeviceRegistry, DiscoveryMonitor};
///
/// # async fn run() -> desklink_core::Result<()> {
/// let scanner = Arc::new(BleScanner::new().await?);
/// let monitor = DiscoveryMonitor::new(scanner, Arc::new(DeviceRegistry::new()));
/// monitor.start_listening().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BleScanner {
    adapter: Adapter,
}

impl BleScanner {
    /// Create a scanner on the first available adapter.
    pub async fn new() -> Result<Self> {
        let adapter = get_adapter().await?;
        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );
        Ok(Self { adapter })
    }

    /// Create a scanner on a specific adapter.
    #[must_use]
    pub fn with_adapter(adapter: Adapter) -> Self {
        Self { adapter }
    }

    /// The underlying adapter.
    #[must_use]
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Resolve one central event to a frame, if it carries one.
    async fn frame_for(adapter: &Adapter, id: &PeripheralId) -> Result<Option<Advertisement>> {
        let peripheral = adapter.peripheral(id).await?;
        let Some(properties) = peripheral.properties().await? else {
            return Ok(None);
        };
        // Peripherals restored from the platform cache may have no RSSI.
        let Some(rssi) = properties.rssi else {
            return Ok(None);
        };

        Ok(Some(Advertisement::new(
            address_from(properties.address),
            properties.local_name,
            rssi,
        )))
    }
}

#[async_trait]
impl AdvertisementSource for BleScanner {
    async fn start(&self) -> Result<AdvertisementStream> {
        self.adapter.start_scan(ScanFilter::default()).await?;
        let events = self.adapter.events().await?;
        info!("BLE scan started");

        let adapter = self.adapter.clone();
        let stream = events.filter_map(move |event| {
            let adapter = adapter.clone();
            async move {
                let id = match event {
                    CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
                    _ => return None,
                };
                match Self::frame_for(&adapter, &id).await {
                    Ok(frame) => frame.map(Ok),
                    Err(e) => {
                        // One unreadable peripheral must not end the stream.
                        debug!("Skipping peripheral {:?}: {}", id, e);
                        None
                    }
                }
            }
        });
        Ok(stream.boxed())
    }

    async fn stop(&self) -> Result<()> {
        self.adapter.stop_scan().await?;
        info!("BLE scan stopped");
        Ok(())
    }
}

fn address_from(address: BDAddr) -> BtAddress {
    BtAddress::from_octets(address.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_conversion_preserves_octet_order() {
        let bd = BDAddr::from([0xE7, 0xA1, 0xF7, 0x84, 0x2F, 0x17]);
        let address = address_from(bd);
        assert_eq!(address, BtAddress::new(0xE7A1_F784_2F17));
        assert_eq!(address.to_string(), "E7:A1:F7:84:2F:17");
    }
}
