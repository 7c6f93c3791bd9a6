//! Reads a QN-protocol bluetooth body scale: handshake, wait for a stable
//! weight, say goodbye, and hand the reading to the configured sinks.

pub mod config;
pub mod constants;
pub mod decoding;
pub mod encoding;
pub mod error;
pub mod link;
pub mod logging;
pub mod poll;
pub mod scale;
pub mod scanner;
pub mod session;
pub mod sink;
pub mod units;

pub use constants::UnitPreference;
pub use decoding::{decode_notification, Notification};
pub use error::{Result, ScaleError, SessionOutcome};
pub use link::{NotificationStream, ScaleConnector, ScaleLink};
pub use poll::{Poller, RetryPolicy};
pub use session::{ReadingSlot, Session, SessionSettings, SessionState};
pub use sink::{Dispatcher, Notifier, Recorder, SqliteRecorder, WebhookNotifier};
pub use units::{kg_of, lb_of, WeightReading};
