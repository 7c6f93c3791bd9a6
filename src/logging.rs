use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::decoding::Notification;
use crate::units::{kg_of, lb_of};

/// Console logging. `RUST_LOG` wins over `level` when set.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:#04x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl Notification {
    pub(crate) fn log(&self) {
        match self {
            Notification::Unsteady { raw } => {
                info!(lb = lb_of(kg_of(*raw)), "Weight still unsteady, hold on...")
            }
            Notification::Stable { raw } => debug!(raw, "stable reading"),
            Notification::UnknownStatus { status, payload } => warn!(
                status = %format!("{status:#04X}"),
                data = %hex(payload),
                "Unknown status byte value"
            ),
        }
    }
}
