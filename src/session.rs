use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::constants::{
    UnitPreference, DEFAULT_ADDRESS, DEFAULT_STABILIZATION_TIMEOUT, STABILIZATION_CHECK_INTERVAL,
};
use crate::decoding::{decode_notification, Notification};
use crate::encoding::{build_goodbye, build_hello, build_timestamp};
use crate::error::{Result, ScaleError};
use crate::link::{NotificationStream, ScaleConnector, ScaleLink};
use crate::units::WeightReading;

/// Lifecycle of one connection attempt. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Connecting,
    Subscribed,
    AwaitingStable,
    Disconnecting,
    Done,
}

/// Finalized reading shared between the notification task and the
/// stabilization wait. `None` means nothing stable has been received, so a
/// stable reading of exactly zero is still a value. Unsteady readings are
/// only logged.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ReadingSlot {
    finalized: Option<WeightReading>,
}

impl ReadingSlot {
    /// Applies one notification. Only the first stable reading is kept.
    pub fn apply(&mut self, notification: &Notification) {
        match *notification {
            Notification::Stable { raw } => {
                if self.finalized.is_none() {
                    self.finalized = Some(WeightReading::from_raw(raw));
                } else {
                    debug!(raw, "ignoring stable reading after the first");
                }
            }
            Notification::Unsteady { .. } | Notification::UnknownStatus { .. } => {}
        }
    }

    pub fn finalized(&self) -> Option<WeightReading> {
        self.finalized
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub address: String,
    pub unit: UnitPreference,
    pub stabilization_timeout: Duration,
    pub check_interval: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            unit: UnitPreference::default(),
            stabilization_timeout: DEFAULT_STABILIZATION_TIMEOUT,
            check_interval: STABILIZATION_CHECK_INTERVAL,
        }
    }
}

/// One connection attempt, from connect to release.
pub struct Session<'a, C: ScaleConnector> {
    connector: &'a C,
    settings: &'a SessionSettings,
    state: SessionState,
}

impl<'a, C: ScaleConnector> Session<'a, C> {
    pub fn new(connector: &'a C, settings: &'a SessionSettings) -> Self {
        Self {
            connector,
            settings,
            state: SessionState::Connecting,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub async fn run(&mut self) -> Result<WeightReading> {
        debug!(address = %self.settings.address, "waiting for scale to appear");
        let link = match self.connector.connect(&self.settings.address).await {
            Ok(link) => link,
            Err(e) => {
                self.advance(SessionState::Done);
                return Err(e);
            }
        };

        let result = self.drive(&link).await;

        self.advance(SessionState::Disconnecting);
        if let Err(e) = link.disconnect().await {
            warn!(error = %e, "failed to release scale connection");
        }
        self.advance(SessionState::Done);

        result
    }

    async fn drive(&mut self, link: &C::Link) -> Result<WeightReading> {
        let notifications = link.subscribe().await?;
        let slot = Arc::new(Mutex::new(ReadingSlot::default()));
        let handler = tokio::spawn(watch_notifications(notifications, Arc::clone(&slot)));
        self.advance(SessionState::Subscribed);

        let result = self.exchange(link, &slot).await;
        handler.abort();
        result
    }

    async fn exchange(&mut self, link: &C::Link, slot: &Mutex<ReadingSlot>) -> Result<WeightReading> {
        link.write(&build_hello(self.settings.unit)).await?;
        link.write(&build_timestamp(OffsetDateTime::now_utc())?).await?;
        self.advance(SessionState::AwaitingStable);

        let reading = self.wait_for_stable(slot).await?;

        link.write(build_goodbye()).await?;
        Ok(reading)
    }

    /// Checks the slot every `check_interval` until the budget runs out. A zero
    /// interval checks once up front and once at the deadline.
    async fn wait_for_stable(&self, slot: &Mutex<ReadingSlot>) -> Result<WeightReading> {
        let deadline = Instant::now() + self.settings.stabilization_timeout;
        loop {
            if let Some(reading) = slot.lock().await.finalized() {
                return Ok(reading);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ScaleError::StabilizationTimeout);
            }
            let step = match self.settings.check_interval {
                interval if interval.is_zero() => remaining,
                interval => interval.min(remaining),
            };
            sleep(step).await;
        }
    }

    fn advance(&mut self, next: SessionState) {
        debug_assert!(next > self.state, "{:?} -> {:?}", self.state, next);
        debug!(from = ?self.state, to = ?next, "session state");
        self.state = next;
    }
}

async fn watch_notifications(mut notifications: NotificationStream, slot: Arc<Mutex<ReadingSlot>>) {
    while let Some(payload) = notifications.next().await {
        match decode_notification(&payload) {
            Ok(notification) => {
                notification.log();
                slot.lock().await.apply(&notification);
            }
            Err(e) => warn!(error = %e, "dropping notification"),
        }
    }
    debug!("notification stream ended");
}
