use hdrhistogram::Histogram;
use std::time::Duration;

/// Histogram bounds in nanoseconds: 1ns to 60s, 3 significant digits.
const LATENCY_LOW_NS: u64 = 1;
const LATENCY_HIGH_NS: u64 = 60_000_000_000;
const LATENCY_SIGFIG: u8 = 3;

fn latency_histogram() -> Histogram<u64> {
    Histogram::new_with_bounds(LATENCY_LOW_NS, LATENCY_HIGH_NS, LATENCY_SIGFIG)
        .expect("static histogram bounds are valid")
}

/// Production counters. Owned by the dispatcher alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Timer firings while running
    pub ticks: u64,
    /// Messages accepted by the queue; also the synthesizer counter
    pub enqueued: u64,
    /// Messages discarded because the queue was full
    pub dropped: u64,
}

/// Tally kept by a single worker and handed back when it exits.
#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub worker_id: usize,
    pub delivered: u64,
    pub failed: u64,
    latency_hist: Histogram<u64>,
}

impl WorkerReport {
    pub fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            delivered: 0,
            failed: 0,
            latency_hist: latency_histogram(),
        }
    }

    pub fn record_delivered(&mut self, latency: Duration) {
        self.delivered += 1;
        self.latency_hist.saturating_record(latency.as_nanos() as u64);
    }

    pub fn record_failed(&mut self) {
        self.failed += 1;
    }

    pub fn attempted(&self) -> u64 {
        self.delivered + self.failed
    }
}

/// Final report of one run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub counters: RunCounters,
    pub delivered: u64,
    pub failed: u64,
    pub elapsed: Duration,
    pub workers: Vec<WorkerReport>,
    latency_hist: Histogram<u64>,
}

impl RunSummary {
    pub fn new(counters: RunCounters, workers: Vec<WorkerReport>, elapsed: Duration) -> Self {
        let mut latency_hist = latency_histogram();
        let mut delivered = 0;
        let mut failed = 0;
        for w in &workers {
            delivered += w.delivered;
            failed += w.failed;
            // identical bounds, cannot overflow
            let _ = latency_hist.add(&w.latency_hist);
        }
        Self {
            counters,
            delivered,
            failed,
            elapsed,
            workers,
            latency_hist,
        }
    }

    /// Messages enqueued per second of wall time
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.counters.enqueued as f64 / secs
        } else {
            0.0
        }
    }

    /// Enqueued messages that no worker picked up before shutdown
    pub fn abandoned(&self) -> u64 {
        self.counters
            .enqueued
            .saturating_sub(self.delivered + self.failed)
    }

    pub fn latency_ns_percentile(&self, quantile: f64) -> u64 {
        self.latency_hist.value_at_quantile(quantile)
    }

    pub fn latency_ns_max(&self) -> u64 {
        self.latency_hist.max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_merges_worker_reports() {
        let mut a = WorkerReport::new(0);
        a.record_delivered(Duration::from_millis(10));
        a.record_delivered(Duration::from_millis(20));
        a.record_failed();
        let mut b = WorkerReport::new(1);
        b.record_delivered(Duration::from_millis(30));

        let counters = RunCounters {
            ticks: 6,
            enqueued: 5,
            dropped: 1,
        };
        let summary = RunSummary::new(counters, vec![a, b], Duration::from_secs(2));
        assert_eq!(summary.delivered, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.abandoned(), 1);
        assert_eq!(summary.throughput(), 2.5);
        let max_ms = summary.latency_ns_max() as f64 / 1e6;
        assert!((max_ms - 30.0).abs() < 0.1, "max was {max_ms}ms");
    }

    #[test]
    fn zero_elapsed_has_zero_throughput() {
        let summary = RunSummary::new(RunCounters::default(), Vec::new(), Duration::ZERO);
        assert_eq!(summary.throughput(), 0.0);
        assert_eq!(summary.latency_ns_percentile(0.99), 0);
        assert_eq!(summary.abandoned(), 0);
    }

    #[test]
    fn worker_report_counts_attempts() {
        let mut r = WorkerReport::new(3);
        r.record_failed();
        r.record_delivered(Duration::from_micros(5));
        assert_eq!(r.attempted(), 2);
        assert_eq!(r.worker_id, 3);
    }
}
