#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;
use qn_scale::{NotificationStream, Result, ScaleConnector, ScaleError, ScaleLink};
use tokio::time::{sleep, Instant};

/// A notification delivered `after` the previous one (or after subscribing).
pub type Step = (Duration, Vec<u8>);

pub fn frame(raw: u16, status: u8) -> Vec<u8> {
    let [hi, lo] = raw.to_be_bytes();
    vec![0x10, 0x0B, 0x15, hi, lo, status, 0x00, 0x00, 0x00, 0x00, 0x00]
}

pub fn unsteady(raw: u16) -> Vec<u8> {
    frame(raw, 0)
}

pub fn stable(raw: u16) -> Vec<u8> {
    frame(raw, 1)
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

pub enum Attempt {
    NotFound,
    Connect {
        notifications: Vec<Step>,
        fail_subscribe: bool,
        /// Writes from this index on (0 = hello) are rejected.
        fail_write_at: Option<usize>,
    },
}

impl Attempt {
    pub fn connect(notifications: Vec<Step>) -> Self {
        Attempt::Connect {
            notifications,
            fail_subscribe: false,
            fail_write_at: None,
        }
    }

    pub fn failing_writes() -> Self {
        Attempt::Connect {
            notifications: Vec::new(),
            fail_subscribe: false,
            fail_write_at: Some(0),
        }
    }

    pub fn failing_subscribe() -> Self {
        Attempt::Connect {
            notifications: Vec::new(),
            fail_subscribe: true,
            fail_write_at: None,
        }
    }

    /// Hello and timestamp go through, the goodbye is rejected.
    pub fn failing_goodbye(notifications: Vec<Step>) -> Self {
        Attempt::Connect {
            notifications,
            fail_subscribe: false,
            fail_write_at: Some(2),
        }
    }
}

#[derive(Clone, Default)]
pub struct Journal {
    pub connects: Arc<Mutex<Vec<Instant>>>,
    pub writes: Arc<Mutex<Vec<Vec<u8>>>>,
    pub disconnects: Arc<AtomicUsize>,
}

impl Journal {
    pub fn connect_offsets(&self, start: Instant) -> Vec<Duration> {
        self.connects
            .lock()
            .unwrap()
            .iter()
            .map(|at| at.duration_since(start))
            .collect()
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

/// Plays back one `Attempt` per connect. Once the script runs out, connecting
/// hangs for an hour and then reports the device as missing.
pub struct ScriptedConnector {
    attempts: Mutex<VecDeque<Attempt>>,
    pub journal: Journal,
}

impl ScriptedConnector {
    pub fn new(attempts: Vec<Attempt>) -> Self {
        Self {
            attempts: Mutex::new(attempts.into()),
            journal: Journal::default(),
        }
    }
}

#[async_trait]
impl ScaleConnector for ScriptedConnector {
    type Link = ScriptedLink;

    async fn connect(&self, address: &str) -> Result<ScriptedLink> {
        self.journal.connects.lock().unwrap().push(Instant::now());
        let next = self.attempts.lock().unwrap().pop_front();
        match next {
            Some(Attempt::Connect {
                notifications,
                fail_subscribe,
                fail_write_at,
            }) => Ok(ScriptedLink {
                notifications: Mutex::new(Some(notifications)),
                fail_subscribe,
                fail_write_at,
                attempted_writes: AtomicUsize::new(0),
                journal: self.journal.clone(),
            }),
            Some(Attempt::NotFound) => Err(ScaleError::DeviceNotFound(address.to_string())),
            None => {
                sleep(Duration::from_secs(3600)).await;
                Err(ScaleError::DeviceNotFound(address.to_string()))
            }
        }
    }
}

pub struct ScriptedLink {
    notifications: Mutex<Option<Vec<Step>>>,
    fail_subscribe: bool,
    fail_write_at: Option<usize>,
    attempted_writes: AtomicUsize,
    journal: Journal,
}

#[async_trait]
impl ScaleLink for ScriptedLink {
    async fn subscribe(&self) -> Result<NotificationStream> {
        if self.fail_subscribe {
            return Err(ScaleError::Other("subscribe rejected".to_string()));
        }
        let steps = self.notifications.lock().unwrap().take().unwrap_or_default();
        Ok(Box::pin(stream! {
            for (after, payload) in steps {
                sleep(after).await;
                yield payload;
            }
        }))
    }

    async fn write(&self, frame: &[u8]) -> Result<()> {
        let index = self.attempted_writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_write_at.is_some_and(|at| index >= at) {
            return Err(ScaleError::Other("write rejected".to_string()));
        }
        self.journal.writes.lock().unwrap().push(frame.to_vec());
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.journal.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
