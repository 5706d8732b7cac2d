use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use flume::TrySendError;
use tokio::time::{Instant, Interval, interval_at, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;
use crate::metrics::stats::{RunCounters, RunSummary};
use crate::payload::{LogMessage, generate_log_message};
use crate::rate::RateController;
use crate::roles::worker::WorkerPool;
use crate::transport::LogSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Running,
    Draining,
    Done,
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// Produce messages at the configured rate until the deadline, then close
/// the queue, wait for every worker, and return the run summary.
pub async fn run_dispatcher(config: &Config, sink: Arc<dyn LogSink>) -> Result<RunSummary> {
    info!(
        rate = config.messages_per_sec.get(),
        duration = %humantime::format_duration(config.duration),
        workers = config.workers.get(),
        url = %config.url,
        "Starting log generator"
    );

    let shutdown = CancellationToken::new();
    let (tx, rx) = flume::bounded::<LogMessage>(config.queue_capacity());
    let pool = WorkerPool::spawn(config.workers.get(), rx, sink, shutdown.clone());

    let start = Instant::now();
    let mut state = DispatchState::Running;
    debug!(%state, "dispatcher started");

    let mut rate = RateController::new(config.messages_per_sec);
    let deadline = sleep(config.duration);
    tokio::pin!(deadline);
    let mut snapshot = config.snapshot_interval.map(|p| interval_at(start + p, p));
    let mut counters = RunCounters::default();
    let mut last_snapshot = (start, counters);

    loop {
        tokio::select! {
            biased;
            _ = &mut deadline => {
                shutdown.cancel();
                break;
            }
            _ = rate.tick() => {
                counters.ticks += 1;
                let msg = generate_log_message(counters.enqueued);
                match tx.try_send(msg) {
                    Ok(()) => counters.enqueued += 1,
                    // producer never waits on a full queue
                    Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                        counters.dropped += 1;
                    }
                }
            }
            now = next_snapshot(&mut snapshot) => {
                log_progress(&counters, &last_snapshot, now, start);
                last_snapshot = (now, counters);
            }
        }
    }

    state = transition(state, DispatchState::Draining);
    drop(tx);
    let reports = pool.join().await;

    let elapsed = start.elapsed();
    transition(state, DispatchState::Done);
    Ok(RunSummary::new(counters, reports, elapsed))
}

fn transition(from: DispatchState, to: DispatchState) -> DispatchState {
    debug!(%from, %to, "dispatcher state change");
    to
}

async fn next_snapshot(timer: &mut Option<Interval>) -> Instant {
    match timer {
        Some(t) => t.tick().await,
        None => std::future::pending().await,
    }
}

fn log_progress(
    counters: &RunCounters,
    (last_at, last): &(Instant, RunCounters),
    now: Instant,
    start: Instant,
) {
    let window = now.duration_since(*last_at).as_secs_f64();
    let inst_rate = if window > 0.0 {
        (counters.enqueued - last.enqueued) as f64 / window
    } else {
        0.0
    };
    info!(
        elapsed = %humantime::format_duration(round_to_millis(now.duration_since(start))),
        ticks = counters.ticks,
        enqueued = counters.enqueued,
        dropped = counters.dropped,
        "Progress - Rate(inst): {:.2} msg/s",
        inst_rate
    );
}

/// Trim sub-millisecond noise so durations print as `1s 2ms` rather than
/// `1s 2ms 345us 12ns`.
pub fn round_to_millis(d: Duration) -> Duration {
    Duration::from_millis(d.as_millis() as u64)
}

/// Log the end-of-run report.
pub fn log_summary(summary: &RunSummary) {
    info!(
        "Completed: sent {} messages in {} ({:.2} msg/sec)",
        summary.counters.enqueued,
        humantime::format_duration(round_to_millis(summary.elapsed)),
        summary.throughput()
    );
    info!(
        ticks = summary.counters.ticks,
        dropped = summary.counters.dropped,
        delivered = summary.delivered,
        failed = summary.failed,
        abandoned = summary.abandoned(),
        latency_p50_ms = summary.latency_ns_percentile(0.5) as f64 / 1e6,
        latency_p99_ms = summary.latency_ns_percentile(0.99) as f64 / 1e6,
        latency_max_ms = summary.latency_ns_max() as f64 / 1e6,
        "Delivery summary"
    );
}
