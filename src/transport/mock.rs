//! In-process sink for tests: records what it receives, optionally slow or failing.
use std::time::Duration;

use tokio::sync::Mutex;

use crate::payload::LogMessage;
use crate::transport::{LogSink, SendError};

#[derive(Debug, Default)]
pub struct MockSink {
    latency: Duration,
    fail: bool,
    received: Mutex<Vec<LogMessage>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every send before completing it
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail every send as if the endpoint answered 500
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub async fn received(&self) -> Vec<LogMessage> {
        self.received.lock().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.received.lock().await.len()
    }
}

#[async_trait::async_trait]
impl LogSink for MockSink {
    async fn send(&self, msg: &LogMessage) -> Result<(), SendError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.received.lock().await.push(msg.clone());
        if self.fail {
            return Err(SendError::Status(500));
        }
        Ok(())
    }
}
