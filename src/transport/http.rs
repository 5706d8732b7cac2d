//! HTTP sink: one JSON POST per record, using reqwest.
use std::time::Duration;

use reqwest::header::{self, HeaderValue};
use reqwest::{Client, StatusCode};
use tracing::trace;

use crate::payload::LogMessage;
use crate::transport::{LogSink, SendError};

/// Per-request timeout, covering connect through body read.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct HttpSink {
    client: Client,
    url: String,
}

impl HttpSink {
    pub fn new(url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("log-generator/", env!("CARGO_PKG_VERSION")))
            .timeout(SEND_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, url))
    }

    /// Use an existing client; its connection pool is shared with any clones.
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl LogSink for HttpSink {
    async fn send(&self, msg: &LogMessage) -> Result<(), SendError> {
        let body = serde_json::to_vec(msg)?;

        let request = self
            .client
            .post(&self.url)
            .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body)
            .build()
            .map_err(SendError::Build)?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(SendError::Request)?;

        let status = response.status();
        // drain so the connection goes back to the pool
        if let Err(e) = response.bytes().await {
            trace!(error = %e, "failed to drain response body");
        }

        match status {
            StatusCode::OK | StatusCode::CREATED => Ok(()),
            other => Err(SendError::Status(other.as_u16())),
        }
    }
}
