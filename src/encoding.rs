use time::OffsetDateTime;

use crate::constants::{
    UnitPreference, GOODBYE_MAGIC, HELLO_LEN, HELLO_MARKER, HELLO_OPCODE, HELLO_TRAILER,
    SCALE_EPOCH_UNIX, TIMESTAMP_OPCODE,
};
use crate::error::{Result, ScaleError};

/// Additive checksum: the sum of all bytes, truncated to 8 bits.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

pub fn build_hello(unit: UnitPreference) -> Vec<u8> {
    let mut bytes = vec![
        HELLO_OPCODE,
        HELLO_LEN,
        HELLO_MARKER,
        unit.value(),
        HELLO_TRAILER,
        0x00,
        0x00,
        0x00,
        0x00,
    ];
    bytes.push(checksum(&bytes));
    bytes
}

/// Opcode, then the low three bytes of the seconds since the scale epoch,
/// least significant first, then a zero byte. The scale has only ever been
/// seen to accept zero in the last position. This frame carries no checksum.
pub fn build_timestamp(now: OffsetDateTime) -> Result<Vec<u8>> {
    let delta = now.unix_timestamp() - SCALE_EPOCH_UNIX;
    if delta < 0 {
        return Err(ScaleError::ClockBeforeEpoch);
    }
    let seconds = u32::try_from(delta).map_err(|_| ScaleError::TimestampOverflow)?;

    let [b0, b1, b2, _] = seconds.to_le_bytes();
    Ok(vec![TIMESTAMP_OPCODE, b0, b1, b2, 0x00])
}

pub fn build_goodbye() -> &'static [u8] {
    &GOODBYE_MAGIC
}
