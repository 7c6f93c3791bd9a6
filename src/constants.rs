use std::time::Duration;

use btleplug::api::bleuuid::uuid_from_u16;
use uuid::Uuid;

/// Notifications arrive on 0000fff1-0000-1000-8000-00805f9b34fb.
pub const NOTIFY_CHARACTERISTIC_UUID: Uuid = uuid_from_u16(0xFFF1);
/// Commands are written to 0000fff2-0000-1000-8000-00805f9b34fb.
pub const WRITE_CHARACTERISTIC_UUID: Uuid = uuid_from_u16(0xFFF2);

pub const DEFAULT_ADDRESS: &str = "FF:03:00:38:F5:0B";

// Hello frame: opcode, length, marker, unit, marker, four reserved bytes, checksum.
pub(crate) const HELLO_OPCODE: u8 = 0x13;
pub(crate) const HELLO_LEN: u8 = 0x09;
pub(crate) const HELLO_MARKER: u8 = 0x15;
pub(crate) const HELLO_TRAILER: u8 = 0x10;

pub(crate) const TIMESTAMP_OPCODE: u8 = 0x02;

pub(crate) const GOODBYE_MAGIC: [u8; 5] = [0x1F, 0x05, 0x21, 0x10, 0x49];

/// The scale counts seconds from this instant instead of the unix epoch.
pub const SCALE_EPOCH_UNIX: i64 = 946_702_800;

pub const NOTIFICATION_MIN_LEN: usize = 6;
pub(crate) const WEIGHT_OFFSET: usize = 3;
pub(crate) const STATUS_OFFSET: usize = 5;

pub(crate) const STATUS_UNSTEADY: u8 = 0;
pub(crate) const STATUS_STABLE: u8 = 1;

pub const KG_TO_LB: f64 = 2.20462;

pub const DEFAULT_STABILIZATION_TIMEOUT: Duration = Duration::from_secs(10);
pub const STABILIZATION_CHECK_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_RETRY_COOLDOWN: Duration = Duration::from_secs(10);
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SINK_TIMEOUT: Duration = Duration::from_secs(5);

/// Unit shown on the scale's own display. It has no effect on the
/// notifications, which always carry hundredths of a kilogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum UnitPreference {
    Kilograms,
    #[default]
    Pounds,
}

impl UnitPreference {
    pub fn value(&self) -> u8 {
        match *self {
            UnitPreference::Kilograms => 0x01,
            UnitPreference::Pounds => 0x02,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn characteristic_uuids_expand_to_full_form() {
        assert_eq!(
            NOTIFY_CHARACTERISTIC_UUID.to_string(),
            "0000fff1-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            WRITE_CHARACTERISTIC_UUID.to_string(),
            "0000fff2-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn unit_bytes() {
        assert_eq!(UnitPreference::Kilograms.value(), 0x01);
        assert_eq!(UnitPreference::Pounds.value(), 0x02);
        assert_eq!(UnitPreference::default(), UnitPreference::Pounds);
    }
}
