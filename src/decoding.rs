use crate::constants::{
    NOTIFICATION_MIN_LEN, STATUS_OFFSET, STATUS_STABLE, STATUS_UNSTEADY, WEIGHT_OFFSET,
};
use crate::error::{Result, ScaleError};

/// An inbound notification from the weight characteristic.
///
/// Inbound frames are not checksum-validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The scale is still settling; the weight is for display only.
    Unsteady { raw: u16 },
    /// The scale has locked in a final weight.
    Stable { raw: u16 },
    /// Any other status byte. Informational, never an error.
    UnknownStatus { status: u8, payload: Vec<u8> },
}

impl TryFrom<&[u8]> for Notification {
    type Error = ScaleError;

    fn try_from(payload: &[u8]) -> Result<Self> {
        if payload.len() < NOTIFICATION_MIN_LEN {
            return Err(ScaleError::MalformedFrame { len: payload.len() });
        }

        let raw = u16::from_be_bytes([payload[WEIGHT_OFFSET], payload[WEIGHT_OFFSET + 1]]);
        match payload[STATUS_OFFSET] {
            STATUS_UNSTEADY => Ok(Notification::Unsteady { raw }),
            STATUS_STABLE => Ok(Notification::Stable { raw }),
            status => Ok(Notification::UnknownStatus {
                status,
                payload: payload.to_vec(),
            }),
        }
    }
}

pub fn decode_notification(payload: &[u8]) -> Result<Notification> {
    Notification::try_from(payload)
}
