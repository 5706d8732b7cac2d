use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const LEVELS: [Level; 4] = [Level::Info, Level::Warn, Level::Error, Level::Debug];
const SERVICES: [&str; 5] = [
    "api-gateway",
    "user-service",
    "order-service",
    "payment-service",
    "notification-service",
];
const METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "PATCH"];
const PATHS: [&str; 5] = [
    "/api/users",
    "/api/orders",
    "/api/payments",
    "/api/notifications",
    "/health",
];

/// Size of the user id space; ids cycle through `user-0..user-999`.
const USER_ID_SPACE: u64 = 1000;

/// Severity of a synthesized log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Info,
    Warn,
    Error,
    Debug,
}

/// One fake structured log event, serialized as a flat JSON object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub service: String,
    pub message: String,
    pub request_id: String,
    pub user_id: String,
    pub duration_ms: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Build the log record for a given production counter.
///
/// Everything except `timestamp` and `request_id` is a pure function of
/// `count`: level and service rotate round-robin, and every third record
/// carries an HTTP method and path.
pub fn generate_log_message(count: u64) -> LogMessage {
    let now = Utc::now();
    let level = LEVELS[(count % LEVELS.len() as u64) as usize];
    let service = SERVICES[(count % SERVICES.len() as u64) as usize];
    let duration_ms = 50 + (count % 200) as u32;

    let (message, status_code) = match level {
        Level::Error => (
            format!("Request failed with error: connection timeout after {}ms", duration_ms),
            500,
        ),
        Level::Warn => (
            format!("Request completed with warning: slow response time {}ms", duration_ms),
            200,
        ),
        Level::Info | Level::Debug => (
            format!("Request processed successfully in {}ms", duration_ms),
            200,
        ),
    };

    let (method, path) = if count % 3 == 0 {
        let i = (count % METHODS.len() as u64) as usize;
        (Some(METHODS[i].to_string()), Some(PATHS[i].to_string()))
    } else {
        (None, None)
    };

    LogMessage {
        timestamp: now,
        level,
        service: service.to_string(),
        message,
        request_id: format!("req-{}-{}", now.timestamp(), count),
        user_id: format!("user-{}", count % USER_ID_SPACE),
        duration_ms,
        status_code: Some(status_code),
        method,
        path,
    }
}
