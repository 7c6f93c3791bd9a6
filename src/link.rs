use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::Stream;

use crate::error::Result;

/// Raw notification payloads from the scale's notify characteristic.
pub type NotificationStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// Finds and connects to the scale by address.
#[async_trait]
pub trait ScaleConnector: Send + Sync {
    type Link: ScaleLink;

    /// Fails with `ScaleError::DeviceNotFound` when the device does not show up
    /// within the connector's discovery window.
    async fn connect(&self, address: &str) -> Result<Self::Link>;
}

/// A live connection to the scale.
#[async_trait]
pub trait ScaleLink: Send + Sync {
    async fn subscribe(&self) -> Result<NotificationStream>;
    async fn write(&self, frame: &[u8]) -> Result<()>;
    async fn disconnect(&self) -> Result<()>;
}
