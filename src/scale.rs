use async_stream::stream;
use async_trait::async_trait;
use btleplug::api::{CharPropFlags, Characteristic, Peripheral, WriteType};
use btleplug::platform::Peripheral as PeripheralStruct;
use futures::StreamExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::constants::{NOTIFY_CHARACTERISTIC_UUID, WRITE_CHARACTERISTIC_UUID};
use crate::error::{Result, ScaleError};
use crate::link::{NotificationStream, ScaleLink};
use crate::logging::hex;

/// A connected scale with its notify and write characteristics resolved.
pub struct QnScale {
    peripheral: PeripheralStruct,
    notify_characteristic: Characteristic,
    write_characteristic: Characteristic,
}

impl QnScale {
    pub(crate) async fn connect(peripheral: PeripheralStruct) -> Result<Self> {
        if let Err(e) = peripheral.connect().await {
            debug!(error = %e, "scale did not accept a connection");
            return Err(ScaleError::DeviceNotFound(peripheral.address().to_string()));
        }

        match Self::discover(&peripheral).await {
            Ok((notify_characteristic, write_characteristic)) => Ok(Self {
                peripheral,
                notify_characteristic,
                write_characteristic,
            }),
            Err(e) => {
                if let Err(disconnect_err) = peripheral.disconnect().await {
                    warn!(error = %disconnect_err, "failed to disconnect after setup error");
                }
                Err(e)
            }
        }
    }

    async fn discover(peripheral: &PeripheralStruct) -> Result<(Characteristic, Characteristic)> {
        peripheral.discover_services().await?;
        let notify = Self::find_characteristic(peripheral, NOTIFY_CHARACTERISTIC_UUID)?;
        let write = Self::find_characteristic(peripheral, WRITE_CHARACTERISTIC_UUID)?;
        Ok((notify, write))
    }

    fn find_characteristic(peripheral: &PeripheralStruct, uuid: Uuid) -> Result<Characteristic> {
        peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid)
            .ok_or(ScaleError::CharacteristicNotFound(uuid))
    }

    fn write_type(&self) -> WriteType {
        if self
            .write_characteristic
            .properties
            .contains(CharPropFlags::WRITE)
        {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        }
    }
}

#[async_trait]
impl ScaleLink for QnScale {
    async fn subscribe(&self) -> Result<NotificationStream> {
        let mut notifications = self.peripheral.notifications().await?;
        self.peripheral.subscribe(&self.notify_characteristic).await?;

        let values = stream! {
            while let Some(notification) = notifications.next().await {
                if notification.uuid == NOTIFY_CHARACTERISTIC_UUID {
                    yield notification.value;
                }
            }
        };
        Ok(Box::pin(values))
    }

    async fn write(&self, frame: &[u8]) -> Result<()> {
        self.peripheral
            .write(&self.write_characteristic, frame, self.write_type())
            .await?;
        debug!(frame = %hex(frame), "sent");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.peripheral.disconnect().await?;
        Ok(())
    }
}
