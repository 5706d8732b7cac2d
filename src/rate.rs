use std::num::NonZeroU32;
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Fixed-period ticker for open-loop message production.
///
/// Ticks that are missed while the caller is busy are skipped rather than
/// replayed as a burst, so the offered rate never exceeds the target.
pub struct RateController {
    interval: Interval,
    period: Duration,
}

impl RateController {
    /// Create a ticker firing `msgs_per_second` times per second. The first
    /// tick fires one full period after creation.
    pub fn new(msgs_per_second: NonZeroU32) -> Self {
        let period = period_for(msgs_per_second);
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval, period }
    }

    /// Wait until the next scheduled tick
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }

    /// Get configured interval between messages
    pub fn period(&self) -> Duration {
        self.period
    }
}

fn period_for(msgs_per_second: NonZeroU32) -> Duration {
    let nanos = 1_000_000_000u64 / u64::from(msgs_per_second.get());
    Duration::from_nanos(nanos.max(1))
}
