use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    BDAddr, Central, CentralEvent, Manager as _, Peripheral, PeripheralProperties, ScanFilter,
};
use btleplug::platform::{Adapter, Manager, Peripheral as PeripheralStruct};
use futures::stream::StreamExt;
use tokio::time::error::Elapsed;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use crate::constants::DEFAULT_DISCOVERY_TIMEOUT;
use crate::error::{Result, ScaleError};
use crate::link::ScaleConnector;
use crate::scale::QnScale;

/// Scans for a scale with a known address and connects to it.
pub struct QnScanner {
    manager: Manager,
    discovery_timeout: Duration,
}

impl QnScanner {
    pub async fn new() -> Result<Self> {
        let manager = Manager::new().await?;
        Ok(Self {
            manager,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
        })
    }

    pub fn with_discovery_timeout(mut self, discovery_timeout: Duration) -> Self {
        self.discovery_timeout = discovery_timeout;
        self
    }

    async fn central(&self) -> Result<Adapter> {
        let adapters = self.manager.adapters().await?;
        adapters.into_iter().next().ok_or(ScaleError::NoAdapter)
    }

    async fn find_peripheral(central: &Adapter, address: BDAddr) -> Result<PeripheralStruct> {
        let mut events = central.events().await?;
        central.start_scan(ScanFilter::default()).await?;

        // The adapter keeps devices from earlier scans. Only trust one that
        // has been heard recently.
        for peripheral in central.peripherals().await? {
            if peripheral.address() == address
                && is_advertising(peripheral.properties().await?.as_ref())
            {
                return Ok(peripheral);
            }
        }

        while let Some(event) = events.next().await {
            if let CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) = event {
                let peripheral = central.peripheral(&id).await?;
                if peripheral.address() == address {
                    return Ok(peripheral);
                }
            }
        }

        Err(ScaleError::DeviceNotFound(address.to_string()))
    }
}

/// A cached peripheral only counts as present while the adapter reports a
/// signal strength for it.
fn is_advertising(properties: Option<&PeripheralProperties>) -> bool {
    properties.is_some_and(|p| p.rssi.is_some())
}

/// Locating and connecting share one window. Running out of it means the
/// scale is not there.
fn within_window<T>(
    address: BDAddr,
    attempt: std::result::Result<Result<T>, Elapsed>,
) -> Result<T> {
    match attempt {
        Ok(result) => result,
        Err(_) => {
            debug!(%address, "discovery window elapsed");
            Err(ScaleError::DeviceNotFound(address.to_string()))
        }
    }
}

#[async_trait]
impl ScaleConnector for QnScanner {
    type Link = QnScale;

    async fn connect(&self, address: &str) -> Result<QnScale> {
        let address =
            BDAddr::from_str(address).map_err(|_| ScaleError::InvalidAddress(address.to_string()))?;
        let central = self.central().await?;
        let deadline = Instant::now() + self.discovery_timeout;

        let found = timeout_at(deadline, Self::find_peripheral(&central, address)).await;
        if let Err(e) = central.stop_scan().await {
            warn!(error = %e, "failed to stop scan");
        }
        let peripheral = within_window(address, found)?;
        debug!(%address, "scale discovered");

        let connected = timeout_at(deadline, QnScale::connect(peripheral.clone())).await;
        if connected.is_err() {
            if let Err(e) = peripheral.disconnect().await {
                warn!(error = %e, "failed to release scale after connect timeout");
            }
        }
        within_window(address, connected)
    }
}
