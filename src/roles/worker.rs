use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::metrics::stats::WorkerReport;
use crate::payload::LogMessage;
use crate::transport::LogSink;

/// Fixed set of sender tasks draining one shared queue.
pub struct WorkerPool {
    handles: Vec<JoinHandle<WorkerReport>>,
}

impl WorkerPool {
    /// Spawn `workers` consumers. Each runs until the queue is closed and
    /// drained, or until `shutdown` fires while it is idle.
    pub fn spawn(
        workers: usize,
        queue: flume::Receiver<LogMessage>,
        sink: Arc<dyn LogSink>,
        shutdown: CancellationToken,
    ) -> Self {
        let handles = (0..workers)
            .map(|id| {
                tokio::spawn(run_worker(
                    id,
                    queue.clone(),
                    Arc::clone(&sink),
                    shutdown.clone(),
                ))
            })
            .collect();
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every worker to exit and collect their reports.
    pub async fn join(self) -> Vec<WorkerReport> {
        join_all(self.handles)
            .await
            .into_iter()
            .filter_map(|res| match res {
                Ok(report) => Some(report),
                Err(e) => {
                    error!(error = %e, "worker task failed");
                    None
                }
            })
            .collect()
    }
}

async fn run_worker(
    id: usize,
    queue: flume::Receiver<LogMessage>,
    sink: Arc<dyn LogSink>,
    shutdown: CancellationToken,
) -> WorkerReport {
    let mut report = WorkerReport::new(id);

    loop {
        if shutdown.is_cancelled() {
            break;
        }
        let msg = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            recv = queue.recv_async() => match recv {
                Ok(msg) => msg,
                // closed and drained
                Err(flume::RecvError::Disconnected) => break,
            },
        };

        let started = Instant::now();
        match sink.send(&msg).await {
            Ok(()) => report.record_delivered(started.elapsed()),
            Err(e) => {
                error!(worker = id, error = %e, timeout = e.is_timeout(), "Worker send failed");
                report.record_failed();
            }
        }
    }

    debug!(
        worker = id,
        delivered = report.delivered,
        failed = report.failed,
        "Worker exiting"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::generate_log_message;
    use crate::transport::mock::MockSink;
    use std::time::Duration;

    #[tokio::test]
    async fn drains_closed_queue_then_exits() {
        let (tx, rx) = flume::bounded(16);
        for c in 0..10 {
            tx.try_send(generate_log_message(c)).unwrap();
        }
        drop(tx);

        let sink = Arc::new(MockSink::new());
        let pool = WorkerPool::spawn(3, rx, sink.clone(), CancellationToken::new());
        assert_eq!(pool.len(), 3);
        let reports = pool.join().await;

        assert_eq!(reports.len(), 3);
        let delivered: u64 = reports.iter().map(|r| r.delivered).sum();
        assert_eq!(delivered, 10);
        assert_eq!(sink.count().await, 10);
    }

    #[tokio::test]
    async fn failures_do_not_stop_workers() {
        let (tx, rx) = flume::bounded(8);
        for c in 0..8 {
            tx.try_send(generate_log_message(c)).unwrap();
        }
        drop(tx);

        let sink = Arc::new(MockSink::new().failing());
        let reports = WorkerPool::spawn(2, rx, sink.clone(), CancellationToken::new())
            .join()
            .await;

        let failed: u64 = reports.iter().map(|r| r.failed).sum();
        assert_eq!(failed, 8);
        assert!(reports.iter().all(|r| r.delivered == 0));
        assert_eq!(sink.count().await, 8);
    }

    #[tokio::test]
    async fn cancellation_stops_idle_workers() {
        let (tx, rx) = flume::bounded::<LogMessage>(4);
        let shutdown = CancellationToken::new();
        let pool = WorkerPool::spawn(4, rx, Arc::new(MockSink::new()), shutdown.clone());

        shutdown.cancel();
        let reports = pool.join().await;
        assert_eq!(reports.len(), 4);
        assert!(reports.iter().all(|r| r.attempted() == 0));
        // sender still open: exit came from the token, not the queue
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_send_completes_after_cancellation() {
        let (tx, rx) = flume::bounded(4);
        let shutdown = CancellationToken::new();
        let sink = Arc::new(MockSink::new().with_latency(Duration::from_secs(3)));
        let pool = WorkerPool::spawn(1, rx, sink.clone(), shutdown.clone());

        tx.try_send(generate_log_message(0)).unwrap();
        tx.try_send(generate_log_message(1)).unwrap();
        // let the worker pick up the first message
        tokio::time::sleep(Duration::from_millis(10)).await;
        shutdown.cancel();
        drop(tx);

        let reports = pool.join().await;
        assert_eq!(reports[0].delivered, 1);
        let received = sink.received().await;
        assert_eq!(received.len(), 1);
        assert!(received[0].request_id.ends_with("-0"));
    }
}
