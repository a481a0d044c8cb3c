//! Example: Watching for desk peripherals
//!
//! Scans for BLE advertisements and prints discovery, name-resolution, and
//! expiry events as they happen. Devices that stop advertising for 30
//! seconds are evicted.
//!
//! Run with: `cargo run --example watch_devices`

use std::sync::Arc;
use std::time::Duration;

use desklink_core::{BleScanner, DeviceRegistry, DiscoveryMonitor, ExpiryMonitor};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let scanner = Arc::new(BleScanner::new().await?);
    let registry = Arc::new(DeviceRegistry::new());
    let monitor = ExpiryMonitor::with_timeout(
        DiscoveryMonitor::new(scanner, registry),
        Duration::from_secs(30),
    )?;

    let mut discovered = monitor.discovered();
    let mut name_updates = monitor.name_updates();
    let mut expired = monitor.expired();

    monitor.start_listening().await?;
    println!("Watching for advertisements (Ctrl-C to stop)...");
    println!();

    loop {
        tokio::select! {
            Ok(device) = discovered.recv() => {
                println!(
                    "+ {}  {}  ({} dBm)",
                    device.mac_address(),
                    device.name().unwrap_or("<no name yet>"),
                    device.rssi()
                );
            }
            Ok(device) = name_updates.recv() => {
                println!(
                    "~ {}  is now known as {}",
                    device.mac_address(),
                    device.name().unwrap_or("?")
                );
            }
            Ok(device) = expired.recv() => {
                println!("- {}  gone silent, evicted", device.mac_address());
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    monitor.stop_listening().await?;
    println!();
    println!("{} device(s) still registered", monitor.discovered_devices().len());
    Ok(())
}
