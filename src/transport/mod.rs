//! Delivery abstraction: the sink trait, its error type, and implementations.

pub mod http;
#[cfg(any(test, feature = "sink-mock"))]
pub mod mock;

use crate::payload::LogMessage;

pub use self::http::HttpSink;

#[derive(thiserror::Error, Debug)]
pub enum SendError {
    #[error("marshal error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("request creation error: {0}")]
    Build(#[source] reqwest::Error),
    #[error("request error: {0}")]
    Request(#[source] reqwest::Error),
    #[error("unexpected status code: {0}")]
    Status(u16),
}

impl SendError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request(e) if e.is_timeout())
    }
}

/// Destination for synthesized log records. One call delivers one record.
#[async_trait::async_trait]
pub trait LogSink: Send + Sync {
    async fn send(&self, msg: &LogMessage) -> Result<(), SendError>;
}
