//! Discovery monitoring via broadcast advertisements.
//!
//! A [`DiscoveryMonitor`] consumes the frame stream of an
//! [`AdvertisementSource`], keeps a [`DeviceRegistry`] current, and fans the
//! traffic out as three distinct event streams:
//!
//! - `discovered` — an address was seen for the first time
//! - `updated` — a known address advertised again (always fires)
//! - `name_updates` — a previously nameless device resolved its name
//!
//! Frames are classified in arrival order by a single background task, so
//! the first advertisement that carries a name is the one that names the
//! device.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use desklink_core::{BleScanner, DeviceRegistry, DiscoveryMonitor};
//!
//! let scanner = Arc::new(BleScanner::new().await?);
//! let registry = Arc::new(DeviceRegistry::new());
//! let monitor = DiscoveryMonitor::new(scanner, Arc::clone(&registry));
//!
//! let mut discovered = monitor.discovered();
//! monitor.start_listening().await?;
//! while let Ok(device) = discovered.recv().await {
//!     println!("found {} ({:?})", device.mac_address(), device.name());
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::device::Device;
use crate::error::{Error, Result};
use crate::events::{DEFAULT_EVENT_CAPACITY, EventChannel, EventReceiver};
use crate::registry::DeviceRegistry;
use crate::source::{Advertisement, AdvertisementSource, AdvertisementStream};
use desklink_types::BtAddress;

/// Options for discovery monitoring.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Buffered capacity of each event channel.
    pub channel_capacity: usize,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl DiscoveryOptions {
    /// Create new options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the event channel capacity.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Validate the options.
    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            return Err(Error::invalid_argument(
                "channel_capacity must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// The event channels a monitor publishes on.
#[derive(Debug, Clone)]
struct DiscoveryEvents {
    discovered: EventChannel<Device>,
    updated: EventChannel<Device>,
    name_updates: EventChannel<Device>,
}

impl DiscoveryEvents {
    fn new(capacity: usize) -> Self {
        Self {
            discovered: EventChannel::new(capacity),
            updated: EventChannel::new(capacity),
            name_updates: EventChannel::new(capacity),
        }
    }
}

/// A running background task and the token that cancels it.
pub(crate) struct Worker {
    pub(crate) cancel: CancellationToken,
    pub(crate) handle: JoinHandle<()>,
}

impl Worker {
    /// Cancel the task without waiting for it to wind down.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel the task and wait for it to wind down.
    pub(crate) async fn shut_down(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}

/// Event-driven device discovery over an advertisement source.
///
/// The monitor owns one background task while listening. Starting an
/// already-listening monitor and stopping an already-stopped one are both
/// no-ops. When the source stream completes or fails, the monitor stops
/// itself (logged, never panics) and can be started again.
pub struct DiscoveryMonitor {
    source: Arc<dyn AdvertisementSource>,
    registry: Arc<DeviceRegistry>,
    events: DiscoveryEvents,
    listening: Arc<AtomicBool>,
    worker: Mutex<Option<Worker>>,
}

impl DiscoveryMonitor {
    /// Create a monitor with default options.
    #[must_use]
    pub fn new(source: Arc<dyn AdvertisementSource>, registry: Arc<DeviceRegistry>) -> Self {
        Self::build(source, registry, DiscoveryOptions::default())
    }

    /// Create a monitor with the given options.
    pub fn with_options(
        source: Arc<dyn AdvertisementSource>,
        registry: Arc<DeviceRegistry>,
        options: DiscoveryOptions,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(source, registry, options))
    }

    fn build(
        source: Arc<dyn AdvertisementSource>,
        registry: Arc<DeviceRegistry>,
        options: DiscoveryOptions,
    ) -> Self {
        Self {
            source,
            registry,
            events: DiscoveryEvents::new(options.channel_capacity),
            listening: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    /// Subscribe to first sightings of an address.
    pub fn discovered(&self) -> EventReceiver<Device> {
        self.events.discovered.subscribe()
    }

    /// Subscribe to repeat advertisements of known addresses.
    pub fn updated(&self) -> EventReceiver<Device> {
        self.events.updated.subscribe()
    }

    /// Subscribe to devices whose name just became known.
    pub fn name_updates(&self) -> EventReceiver<Device> {
        self.events.name_updates.subscribe()
    }

    /// Whether the background task is consuming advertisements right now.
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Remove a device from the registry. Unknown devices are a no-op.
    pub fn remove_device(&self, device: &Device) {
        self.registry.remove(device);
    }

    /// Fetch the registered snapshot for an address.
    #[must_use]
    pub fn try_get_device(&self, address: BtAddress) -> Option<Device> {
        self.registry.get(address)
    }

    /// Owned copies of every registered device, ordered by address.
    #[must_use]
    pub fn discovered_devices(&self) -> Vec<Device> {
        self.registry.snapshot()
    }

    pub(crate) fn registry(&self) -> Arc<DeviceRegistry> {
        Arc::clone(&self.registry)
    }

    /// Start consuming advertisements. No-op if already listening.
    ///
    /// Returns an error only when the source itself refuses to start;
    /// failures after startup are logged and stop the monitor instead.
    pub async fn start_listening(&self) -> Result<()> {
        let mut worker = self.worker.lock().await;
        if let Some(active) = worker.take() {
            if !active.handle.is_finished() {
                debug!("Discovery monitor is already listening");
                *worker = Some(active);
                return Ok(());
            }
            // The previous task stopped itself (source completed or
            // failed); fall through and start fresh.
        }

        let stream = self.source.start().await?;
        info!("Discovery monitor listening");

        let cancel = CancellationToken::new();
        self.listening.store(true, Ordering::SeqCst);
        let handle = tokio::spawn(Self::run(
            stream,
            Arc::clone(&self.registry),
            self.events.clone(),
            Arc::clone(&self.listening),
            cancel.clone(),
        ));
        *worker = Some(Worker { cancel, handle });
        Ok(())
    }

    /// Stop consuming advertisements. No-op if not listening.
    pub async fn stop_listening(&self) -> Result<()> {
        let mut worker = self.worker.lock().await;
        let Some(active) = worker.take() else {
            debug!("Discovery monitor is already stopped");
            return Ok(());
        };

        active.cancel.cancel();
        let stop_result = self.source.stop().await;
        let _ = active.handle.await;
        self.listening.store(false, Ordering::SeqCst);
        info!("Discovery monitor stopped");
        stop_result
    }

    async fn run(
        mut stream: AdvertisementStream,
        registry: Arc<DeviceRegistry>,
        events: DiscoveryEvents,
        listening: Arc<AtomicBool>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Discovery monitor task cancelled");
                    break;
                }
                frame = stream.next() => match frame {
                    Some(Ok(frame)) => Self::observe(&registry, &events, frame),
                    Some(Err(e)) => {
                        warn!("Advertisement source failed: {}", e);
                        break;
                    }
                    None => {
                        info!("Advertisement source completed");
                        break;
                    }
                }
            }
        }
        listening.store(false, Ordering::SeqCst);
    }

    /// Classify one frame against the registry and publish the outcome.
    fn observe(registry: &DeviceRegistry, events: &DiscoveryEvents, frame: Advertisement) {
        let device = Device::from(&frame);
        match registry.get(device.address()) {
            None => {
                registry.add_or_update(&device);
                events.discovered.send(device);
            }
            Some(prior) => {
                let name_resolved = prior.name().is_none() && device.name().is_some();
                registry.add_or_update(&device);
                events.updated.send(device.clone());
                if name_resolved {
                    events.name_updates.send(device);
                }
            }
        }
    }
}

impl Drop for DiscoveryMonitor {
    fn drop(&mut self) {
        // Best effort: the task also exits on its own when the stream ends.
        if let Ok(mut worker) = self.worker.try_lock()
            && let Some(active) = worker.take()
        {
            active.cancel();
        }
    }
}
