use std::num::{NonZeroU32, NonZeroUsize};
use std::time::Duration;

/// Upper bound on `--rate`; beyond this the tick period would fall below 1ns.
pub const MAX_MESSAGES_PER_SEC: i64 = 1_000_000_000;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("rate must be a positive number of messages per second, got {0}")]
    InvalidRate(i64),
    #[error("rate {0} exceeds the maximum of {max} messages per second", max = MAX_MESSAGES_PER_SEC)]
    RateTooHigh(i64),
    #[error("workers must be a positive number, got {0}")]
    InvalidWorkers(i64),
}

/// Validated run configuration. Built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct Config {
    pub url: String,
    pub messages_per_sec: NonZeroU32,
    pub duration: Duration,
    pub workers: NonZeroUsize,
    /// Period of progress log lines; `None` disables them
    pub snapshot_interval: Option<Duration>,
}

impl Config {
    pub fn new(
        url: impl Into<String>,
        rate: i64,
        duration: Duration,
        workers: i64,
    ) -> Result<Self, ConfigError> {
        if rate > MAX_MESSAGES_PER_SEC {
            return Err(ConfigError::RateTooHigh(rate));
        }
        let messages_per_sec = u32::try_from(rate)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or(ConfigError::InvalidRate(rate))?;
        let workers = usize::try_from(workers)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or(ConfigError::InvalidWorkers(workers))?;

        Ok(Self {
            url: url.into(),
            messages_per_sec,
            duration,
            workers,
            snapshot_interval: None,
        })
    }

    pub fn with_snapshot_interval(mut self, interval: Option<Duration>) -> Self {
        self.snapshot_interval = interval.filter(|d| !d.is_zero());
        self
    }

    /// At most one second of backlog is buffered before drops begin.
    pub fn queue_capacity(&self) -> usize {
        self.messages_per_sec.get() as usize
    }
}

/// Parse a `--duration` value such as `60s`, `1m 30s` or `500ms`.
///
/// A leading `-` is accepted and yields a zero duration, so the run ends
/// immediately.
pub fn parse_run_duration(s: &str) -> Result<Duration, humantime::DurationError> {
    let s = s.trim();
    match s.strip_prefix('-') {
        Some(rest) => humantime::parse_duration(rest.trim()).map(|_| Duration::ZERO),
        None => humantime::parse_duration(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_defaults() {
        let cfg = Config::new("http://fluent-bit:9880", 1000, Duration::from_secs(60), 10).unwrap();
        assert_eq!(cfg.messages_per_sec.get(), 1000);
        assert_eq!(cfg.workers.get(), 10);
        assert_eq!(cfg.queue_capacity(), 1000);
        assert!(cfg.snapshot_interval.is_none());
    }

    #[test]
    fn rejects_non_positive_rate() {
        for rate in [0, -1, -1000] {
            let err = Config::new("http://x", rate, Duration::from_secs(1), 1).unwrap_err();
            assert_eq!(err, ConfigError::InvalidRate(rate));
        }
    }

    #[test]
    fn rejects_rate_above_nanosecond_resolution() {
        let err = Config::new("http://x", MAX_MESSAGES_PER_SEC + 1, Duration::from_secs(1), 1)
            .unwrap_err();
        assert_eq!(err, ConfigError::RateTooHigh(MAX_MESSAGES_PER_SEC + 1));
        assert!(Config::new("http://x", MAX_MESSAGES_PER_SEC, Duration::from_secs(1), 1).is_ok());
    }

    #[test]
    fn rejects_non_positive_workers() {
        for workers in [0, -3] {
            let err = Config::new("http://x", 10, Duration::from_secs(1), workers).unwrap_err();
            assert_eq!(err, ConfigError::InvalidWorkers(workers));
        }
    }

    #[test]
    fn zero_snapshot_interval_disables_progress() {
        let cfg = Config::new("http://x", 10, Duration::from_secs(1), 1)
            .unwrap()
            .with_snapshot_interval(Some(Duration::ZERO));
        assert!(cfg.snapshot_interval.is_none());
    }

    #[test]
    fn parses_durations() {
        assert_eq!(parse_run_duration("60s").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_run_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_run_duration("1m 30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_run_duration("0s").unwrap(), Duration::ZERO);
        assert_eq!(parse_run_duration("-5s").unwrap(), Duration::ZERO);
        assert!(parse_run_duration("soon").is_err());
        assert!(parse_run_duration("-soon").is_err());
    }
}
