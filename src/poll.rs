use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info};

use crate::constants::{DEFAULT_POLL_INTERVAL, DEFAULT_RETRY_COOLDOWN};
use crate::error::SessionOutcome;
use crate::link::ScaleConnector;
use crate::session::{Session, SessionSettings};
use crate::sink::Dispatcher;

/// How long to wait before the next attempt, per outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub poll_interval: Duration,
    pub retry_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry_cooldown: DEFAULT_RETRY_COOLDOWN,
        }
    }
}

impl RetryPolicy {
    pub fn delay_after(&self, outcome: &SessionOutcome) -> Duration {
        match outcome {
            SessionOutcome::Success(_) => self.poll_interval,
            SessionOutcome::DeviceNotFound | SessionOutcome::StabilizationTimeout => Duration::ZERO,
            SessionOutcome::OtherError(_) => self.retry_cooldown,
        }
    }
}

/// Runs one session after another, forever.
pub struct Poller<C: ScaleConnector> {
    connector: C,
    settings: SessionSettings,
    policy: RetryPolicy,
    dispatcher: Dispatcher,
}

impl<C: ScaleConnector> Poller<C> {
    pub fn new(
        connector: C,
        settings: SessionSettings,
        policy: RetryPolicy,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            connector,
            settings,
            policy,
            dispatcher,
        }
    }

    /// One attempt: run a fresh session, dispatch a success, report the outcome.
    pub async fn poll_once(&self) -> SessionOutcome {
        let mut session = Session::new(&self.connector, &self.settings);
        let outcome = SessionOutcome::from(session.run().await);

        match &outcome {
            SessionOutcome::Success(reading) => self.dispatcher.dispatch(reading).await,
            SessionOutcome::DeviceNotFound => info!("Device not found, polling again..."),
            SessionOutcome::StabilizationTimeout => {
                info!("Timed out waiting for stabilization, starting over...")
            }
            SessionOutcome::OtherError(detail) => error!(error = %detail, "session failed"),
        }
        outcome
    }

    pub async fn run(&self) {
        loop {
            let outcome = self.poll_once().await;
            let delay = self.policy.delay_after(&outcome);
            if !delay.is_zero() {
                info!("Waiting {} seconds before polling again", delay.as_secs());
                sleep(delay).await;
            }
        }
    }
}
