use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::constants::DEFAULT_SINK_TIMEOUT;
use crate::error::{Result, ScaleError};
use crate::units::WeightReading;

/// Persists finalized readings.
#[async_trait]
pub trait Recorder: Send + Sync {
    async fn record(&self, at: OffsetDateTime, reading: &WeightReading) -> Result<()>;
}

/// Sends a short text message somewhere a human will see it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<()>;
}

pub struct SqliteRecorder {
    pool: SqlitePool,
}

impl SqliteRecorder {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(sink_error)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS weights(\
             id INTEGER PRIMARY KEY AUTOINCREMENT, \
             date_iso8601 TEXT, \
             raw_weight INTEGER, \
             weight_kg REAL, \
             weight_lb REAL)",
        )
        .execute(&pool)
        .await
        .map_err(sink_error)?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Recorder for SqliteRecorder {
    async fn record(&self, at: OffsetDateTime, reading: &WeightReading) -> Result<()> {
        let date = at.format(&Rfc3339).map_err(sink_error)?;
        sqlx::query(
            "INSERT INTO weights (date_iso8601, raw_weight, weight_kg, weight_lb) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(date)
        .bind(i64::from(reading.raw()))
        .bind(reading.kg())
        .bind(reading.lb())
        .execute(&self.pool)
        .await
        .map_err(sink_error)?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    username: &'a str,
    content: &'a str,
}

/// Posts messages to a Discord-style webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    username: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            username: "Scale".to_string(),
        }
    }

    /// Reads the webhook URL from a file, ignoring surrounding whitespace.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let url = tokio::fs::read_to_string(path.as_ref())
            .await
            .map_err(sink_error)?;
        let url = url.trim();
        if url.is_empty() {
            return Err(ScaleError::Sink(format!(
                "webhook file {} is empty",
                path.as_ref().display()
            )));
        }
        Ok(Self::new(url))
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        let message = WebhookMessage {
            username: &self.username,
            content: text,
        };
        self.client
            .post(&self.url)
            .json(&message)
            .send()
            .await
            .map_err(sink_error)?
            .error_for_status()
            .map_err(sink_error)?;
        Ok(())
    }
}

fn sink_error(e: impl std::fmt::Display) -> ScaleError {
    ScaleError::Sink(e.to_string())
}

pub fn format_message(reading: &WeightReading) -> String {
    format!("Weight: {reading}")
}

/// Hands finalized readings to whichever sinks are configured. Sink
/// failures are logged and never reach the caller.
pub struct Dispatcher {
    recorder: Option<Box<dyn Recorder>>,
    notifier: Option<Box<dyn Notifier>>,
    sink_timeout: Duration,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self {
            recorder: None,
            notifier: None,
            sink_timeout: DEFAULT_SINK_TIMEOUT,
        }
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recorder(mut self, recorder: impl Recorder + 'static) -> Self {
        self.recorder = Some(Box::new(recorder));
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Box::new(notifier));
        self
    }

    pub fn with_sink_timeout(mut self, sink_timeout: Duration) -> Self {
        self.sink_timeout = sink_timeout;
        self
    }

    pub fn log_enabled(&self) {
        if self.recorder.is_none() {
            info!("Not recording readings, no database configured");
        }
        if self.notifier.is_none() {
            info!("Not sending messages, no webhook configured");
        }
    }

    pub async fn dispatch(&self, reading: &WeightReading) {
        info!(
            raw = reading.raw(),
            kg = reading.kg(),
            "Weight: {}lb",
            reading.lb()
        );

        if let Some(notifier) = &self.notifier {
            let text = format_message(reading);
            match timeout(self.sink_timeout, notifier.notify(&text)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "failed to send message"),
                Err(_) => warn!("timed out sending message"),
            }
        }

        if let Some(recorder) = &self.recorder {
            let at = OffsetDateTime::now_utc();
            match timeout(self.sink_timeout, recorder.record(at, reading)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "failed to record reading"),
                Err(_) => warn!("timed out recording reading"),
            }
        }
    }
}
