use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::units::WeightReading;

pub type Result<T> = std::result::Result<T, ScaleError>;

#[derive(Debug, Error)]
pub enum ScaleError {
    #[error("scale {0} not found")]
    DeviceNotFound(String),

    #[error("timed out waiting for a stable reading")]
    StabilizationTimeout,

    #[error("malformed notification: expected at least 6 bytes, got {len}")]
    MalformedFrame { len: usize },

    #[error("system clock is before the scale epoch")]
    ClockBeforeEpoch,

    #[error("timestamp does not fit in 32 bits")]
    TimestampOverflow,

    #[error("invalid device address {0:?}")]
    InvalidAddress(String),

    #[error("no bluetooth adapter available")]
    NoAdapter,

    #[error("characteristic {0} not found")]
    CharacteristicNotFound(Uuid),

    #[error("bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    #[error("sink error: {0}")]
    Sink(String),

    #[error("{0}")]
    Other(String),
}

/// What a single connection attempt came to. Exactly one per attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Success(WeightReading),
    DeviceNotFound,
    StabilizationTimeout,
    OtherError(String),
}

impl From<Result<WeightReading>> for SessionOutcome {
    fn from(result: Result<WeightReading>) -> Self {
        match result {
            Ok(reading) => SessionOutcome::Success(reading),
            Err(ScaleError::DeviceNotFound(_))
            | Err(ScaleError::Bluetooth(btleplug::Error::DeviceNotFound)) => {
                SessionOutcome::DeviceNotFound
            }
            Err(ScaleError::StabilizationTimeout) => SessionOutcome::StabilizationTimeout,
            Err(e) => SessionOutcome::OtherError(e.to_string()),
        }
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::Success(reading) => write!(f, "success ({reading})"),
            SessionOutcome::DeviceNotFound => write!(f, "device not found"),
            SessionOutcome::StabilizationTimeout => write!(f, "stabilization timeout"),
            SessionOutcome::OtherError(detail) => write!(f, "error: {detail}"),
        }
    }
}
