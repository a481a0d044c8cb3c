//! Time-based eviction of silent devices.
//!
//! [`ExpiryMonitor`] wraps a [`DiscoveryMonitor`] and adds one behavior: a
//! periodic timer that removes every registered device whose last
//! advertisement is at least one timeout period old, announcing each
//! eviction on the `expired` channel. Everything else is forwarded to the
//! wrapped monitor unchanged.
//!
//! The timer runs from construction and keeps sweeping while the wrapped
//! monitor is not listening; devices registered before a stop therefore
//! still age out. Timer scheduling goes through `tokio::time`, so tests
//! drive it deterministically with a paused clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::device::Device;
use crate::error::{Error, Result};
use crate::events::{EventChannel, EventReceiver};
use crate::monitor::{DiscoveryMonitor, Worker};
use crate::registry::DeviceRegistry;
use desklink_types::BtAddress;

/// Default period after which a silent device is evicted.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Discovery monitor with time-based eviction of silent devices.
///
/// Must be created within a Tokio runtime: construction spawns the sweep
/// timer.
pub struct ExpiryMonitor {
    inner: DiscoveryMonitor,
    timeout: Arc<Mutex<Duration>>,
    expired: EventChannel<Device>,
    timer: Mutex<Option<Worker>>,
}

impl ExpiryMonitor {
    /// Wrap a monitor with the default 60 second timeout.
    #[must_use]
    pub fn new(inner: DiscoveryMonitor) -> Self {
        Self::build(inner, DEFAULT_TIMEOUT)
    }

    /// Wrap a monitor with a custom timeout. Zero is rejected.
    pub fn with_timeout(inner: DiscoveryMonitor, timeout: Duration) -> Result<Self> {
        validate_timeout(timeout)?;
        Ok(Self::build(inner, timeout))
    }

    fn build(inner: DiscoveryMonitor, timeout: Duration) -> Self {
        let monitor = Self {
            inner,
            timeout: Arc::new(Mutex::new(timeout)),
            expired: EventChannel::default(),
            timer: Mutex::new(None),
        };
        monitor.ensure_timer();
        monitor
    }

    /// Subscribe to devices evicted for staying silent too long.
    pub fn expired(&self) -> EventReceiver<Device> {
        self.expired.subscribe()
    }

    /// Current eviction timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        *self.timeout.lock().expect("expiry timeout mutex poisoned")
    }

    /// Change the eviction timeout. Zero is rejected.
    ///
    /// A running timer is cancelled and restarted so the new period takes
    /// effect immediately; a stopped timer only picks the value up on the
    /// next [`start_listening`](Self::start_listening).
    pub fn set_timeout(&self, timeout: Duration) -> Result<()> {
        validate_timeout(timeout)?;
        *self.timeout.lock().expect("expiry timeout mutex poisoned") = timeout;
        self.restart_timer();
        info!("Expiry timeout set to {:?}", timeout);
        Ok(())
    }

    /// Start the wrapped monitor and, if needed, the sweep timer.
    pub async fn start_listening(&self) -> Result<()> {
        self.inner.start_listening().await?;
        self.ensure_timer();
        Ok(())
    }

    /// Stop the sweep timer and the wrapped monitor.
    pub async fn stop_listening(&self) -> Result<()> {
        let timer = self
            .timer
            .lock()
            .expect("expiry timer mutex poisoned")
            .take();
        if let Some(active) = timer {
            active.shut_down().await;
            debug!("Expiry timer stopped");
        }
        self.inner.stop_listening().await
    }

    /// Whether the wrapped monitor is consuming advertisements right now.
    pub fn is_listening(&self) -> bool {
        self.inner.is_listening()
    }

    /// Subscribe to first sightings of an address.
    pub fn discovered(&self) -> EventReceiver<Device> {
        self.inner.discovered()
    }

    /// Subscribe to repeat advertisements of known addresses.
    pub fn updated(&self) -> EventReceiver<Device> {
        self.inner.updated()
    }

    /// Subscribe to devices whose name just became known.
    pub fn name_updates(&self) -> EventReceiver<Device> {
        self.inner.name_updates()
    }

    /// Remove a device from the registry. Unknown devices are a no-op.
    pub fn remove_device(&self, device: &Device) {
        self.inner.remove_device(device);
    }

    /// Fetch the registered snapshot for an address.
    #[must_use]
    pub fn try_get_device(&self, address: BtAddress) -> Option<Device> {
        self.inner.try_get_device(address)
    }

    /// Owned copies of every registered device, ordered by address.
    #[must_use]
    pub fn discovered_devices(&self) -> Vec<Device> {
        self.inner.discovered_devices()
    }

    /// Spawn the sweep timer unless one is already running.
    fn ensure_timer(&self) {
        let mut timer = self.timer.lock().expect("expiry timer mutex poisoned");
        if timer.is_none() {
            *timer = Some(self.spawn_timer());
        }
    }

    /// Cancel a running timer and spawn a fresh one with the current period.
    /// Does nothing while the timer is stopped.
    fn restart_timer(&self) {
        let mut timer = self.timer.lock().expect("expiry timer mutex poisoned");
        if let Some(active) = timer.take() {
            // The old timer is cancelled before its replacement exists, so
            // two sweeps never run for the same monitor.
            active.cancel();
            *timer = Some(self.spawn_timer());
        }
    }

    fn spawn_timer(&self) -> Worker {
        let period = self.timeout();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(Self::run_timer(
            period,
            Arc::clone(&self.timeout),
            self.inner.registry(),
            self.expired.clone(),
            cancel.clone(),
        ));
        debug!("Expiry timer started (period {:?})", period);
        Worker { cancel, handle }
    }

    async fn run_timer(
        period: Duration,
        timeout: Arc<Mutex<Duration>>,
        registry: Arc<DeviceRegistry>,
        expired: EventChannel<Device>,
        cancel: CancellationToken,
    ) {
        // First tick one full period after start, not immediately.
        let mut ticker = interval_at(Instant::now() + period, period);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Expiry timer cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let threshold = *timeout.lock().expect("expiry timeout mutex poisoned");
                    Self::sweep(&registry, &expired, threshold);
                }
            }
        }
    }

    /// Evict every device whose age meets or exceeds the timeout.
    fn sweep(registry: &DeviceRegistry, expired: &EventChannel<Device>, timeout: Duration) {
        let now = Instant::now();
        for device in registry.snapshot() {
            let age = now.saturating_duration_since(device.broadcast_time());
            if age >= timeout {
                registry.remove(&device);
                info!(
                    "Expired device {} (silent for {:?})",
                    device.mac_address(),
                    age
                );
                expired.send(device);
            }
        }
    }
}

impl Drop for ExpiryMonitor {
    fn drop(&mut self) {
        if let Ok(mut timer) = self.timer.lock()
            && let Some(active) = timer.take()
        {
            active.cancel();
        }
    }
}

fn validate_timeout(timeout: Duration) -> Result<()> {
    if timeout.is_zero() {
        return Err(Error::invalid_argument(
            "timeout must be greater than zero",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_at(address: u64, broadcast_time: Instant) -> Device {
        Device::new(BtAddress::new(address), None, -60, broadcast_time)
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(matches!(
            validate_timeout(Duration::ZERO),
            Err(Error::InvalidArgument(_))
        ));
        assert!(validate_timeout(Duration::from_millis(1)).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_evicts_exactly_at_threshold() {
        let registry = DeviceRegistry::new();
        let expired = EventChannel::new(16);
        let mut rx = expired.subscribe();

        registry.add_or_update(&device_at(1, Instant::now()));
        tokio::time::advance(DEFAULT_TIMEOUT).await;
        registry.add_or_update(&device_at(2, Instant::now()));

        ExpiryMonitor::sweep(&registry, &expired, DEFAULT_TIMEOUT);

        // Device 1 is exactly one timeout old: evicted. Device 2 is fresh.
        let evicted = rx.try_recv().unwrap();
        assert_eq!(evicted.address(), BtAddress::new(1));
        assert!(rx.try_recv().is_err());
        assert_eq!(registry.snapshot().len(), 1);
        assert!(registry.get(BtAddress::new(2)).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_keeps_devices_younger_than_timeout() {
        let registry = DeviceRegistry::new();
        let expired = EventChannel::new(16);
        let mut rx = expired.subscribe();

        registry.add_or_update(&device_at(1, Instant::now()));
        tokio::time::advance(DEFAULT_TIMEOUT - Duration::from_millis(1)).await;

        ExpiryMonitor::sweep(&registry, &expired, DEFAULT_TIMEOUT);

        assert!(rx.try_recv().is_err());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_evicts_every_stale_device() {
        let registry = DeviceRegistry::new();
        let expired = EventChannel::new(16);
        let mut rx = expired.subscribe();

        registry.add_or_update(&device_at(1, Instant::now()));
        registry.add_or_update(&device_at(2, Instant::now()));
        registry.add_or_update(&device_at(3, Instant::now()));
        tokio::time::advance(Duration::from_secs(120)).await;

        ExpiryMonitor::sweep(&registry, &expired, DEFAULT_TIMEOUT);

        let mut evicted = vec![
            rx.try_recv().unwrap().address(),
            rx.try_recv().unwrap().address(),
            rx.try_recv().unwrap().address(),
        ];
        evicted.sort();
        assert_eq!(
            evicted,
            vec![BtAddress::new(1), BtAddress::new(2), BtAddress::new(3)]
        );
        assert!(registry.is_empty());
    }
}
