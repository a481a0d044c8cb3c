//! Advertisement frames and the source boundary that produces them.
//!
//! A [`AdvertisementSource`] is anything that can turn platform radio events
//! into a stream of [`Advertisement`] frames: a real adapter
//! ([`crate::scanner::BleScanner`]) or a scripted fake
//! ([`crate::mock::MockAdvertisementSource`]). The
//! [`crate::monitor::DiscoveryMonitor`] consumes the stream without caring
//! which one it is.

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::time::Instant;

use crate::device::Device;
use crate::error::Result;
use desklink_types::BtAddress;

/// One received broadcast advertisement, reduced to what discovery needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    /// Hardware address of the advertising peripheral.
    pub address: BtAddress,
    /// Advertised local name, if the frame carried one.
    pub local_name: Option<String>,
    /// Received signal strength in dBm.
    pub rssi: i16,
    /// Monotonic instant at which the frame was received.
    pub received_at: Instant,
}

impl Advertisement {
    /// Creates a frame timestamped now.
    #[must_use]
    pub fn new(address: BtAddress, local_name: Option<String>, rssi: i16) -> Self {
        Self {
            address,
            local_name,
            rssi,
            received_at: Instant::now(),
        }
    }
}

impl From<&Advertisement> for Device {
    fn from(frame: &Advertisement) -> Self {
        Device::new(
            frame.address,
            frame.local_name.clone(),
            frame.rssi,
            frame.received_at,
        )
    }
}

/// Stream of advertisement frames.
///
/// Every `Ok` item is one received frame. An `Err` item reports an upstream
/// failure after which no further frames will arrive; the end of the stream
/// reports orderly completion. Neither is a panic condition for consumers.
pub type AdvertisementStream = BoxStream<'static, Result<Advertisement>>;

/// Producer of advertisement frames.
#[async_trait]
pub trait AdvertisementSource: Send + Sync {
    /// Start producing frames, returning the stream that carries them.
    ///
    /// Errors here are startup failures (adapter gone, permission denied)
    /// and belong to the caller; failures after startup travel inside the
    /// stream instead.
    async fn start(&self) -> Result<AdvertisementStream>;

    /// Stop producing frames. The stream returned by [`start`] ends.
    ///
    /// [`start`]: AdvertisementSource::start
    async fn stop(&self) -> Result<()>;
}
