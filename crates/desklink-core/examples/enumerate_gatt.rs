//! Example: Enumerating a peripheral's GATT table
//!
//! Scans until the peripheral with the given address shows up, connects,
//! refreshes the service cache, and prints the resulting lookup table.
//!
//! Run with: `cargo run --example enumerate_gatt -- E7:A1:F7:84:2F:17`

use std::sync::Arc;
use std::time::Duration;

use desklink_core::gatt::GattCharacteristicHandle;
use desklink_core::{
    BleGattSession, BleScanner, BtAddress, DeviceRegistry, DiscoveryMonitor, GattEnumerator,
};
use tokio::time::sleep;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let address: BtAddress = std::env::args()
        .nth(1)
        .ok_or("usage: enumerate_gatt <MAC address>")?
        .parse()?;

    // A short scan so the adapter learns about the peripheral.
    let scanner = Arc::new(BleScanner::new().await?);
    let adapter = scanner.adapter().clone();
    let monitor = DiscoveryMonitor::new(scanner, Arc::new(DeviceRegistry::new()));
    println!("Scanning for {address}...");
    monitor.start_listening().await?;
    sleep(Duration::from_secs(5)).await;
    monitor.stop_listening().await?;

    let session = BleGattSession::find(&adapter, address).await?;
    session.connect().await?;

    let enumerator = GattEnumerator::new(Arc::new(session.clone()));
    let status = enumerator.refresh().await;
    println!("Refresh finished: {status}");
    println!();

    let cache = enumerator.cache();
    {
        let view = cache.view();
        println!("{} service(s) cached:", view.len());
        for (uuid, entry) in view.iter() {
            println!("  service {uuid}");
            for characteristic in entry.characteristics() {
                println!("    characteristic {}", characteristic.uuid());
            }
        }
    }

    session.disconnect().await?;
    Ok(())
}
