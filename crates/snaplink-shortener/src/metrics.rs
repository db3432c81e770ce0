use jiff::Timestamp;
use snaplink_core::{Access, Repository, ShortCode, ShortenerError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, warn};
use typed_builder::TypedBuilder;

/// Settings for the background metrics updater.
#[derive(Debug, Clone, TypedBuilder)]
pub struct MetricsConfig {
    /// Number of accesses that may wait in the queue. Accesses recorded
    /// while the queue is full are dropped.
    #[builder(default = 1024)]
    pub queue_capacity: usize,
    /// Number of store updates applied concurrently.
    #[builder(default = 32)]
    pub max_in_flight: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug)]
struct AccessEvent {
    code: ShortCode,
    started: Instant,
}

/// Handle used by the read path to report successful lookups.
///
/// Recording never waits: the access is handed to the worker over a
/// bounded channel and the caller moves on.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    tx: mpsc::Sender<AccessEvent>,
    dropped: Arc<AtomicU64>,
}

/// The task applying recorded accesses to the store.
#[derive(Debug)]
pub struct MetricsWorker {
    handle: JoinHandle<()>,
}

impl MetricsRecorder {
    /// Spawns the metrics worker on the current tokio runtime.
    pub fn spawn<R>(repository: Arc<R>, config: MetricsConfig) -> (Self, MetricsWorker)
    where
        R: Repository + ?Sized,
    {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let handle = tokio::spawn(run_worker(repository, rx, config.max_in_flight.max(1)));

        let recorder = Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (recorder, MetricsWorker { handle })
    }

    /// Schedules a metrics update for a lookup of `code` that began at
    /// `started`. The latency is measured when the update is applied.
    pub fn record(&self, code: ShortCode, started: Instant) {
        match self.tx.try_send(AccessEvent { code, started }) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(code = %event.code, dropped, "metrics queue is full, dropping access");
            }
            Err(TrySendError::Closed(event)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(code = %event.code, dropped, "metrics worker has stopped, dropping access");
            }
        }
    }

    /// Total accesses discarded so far because the queue was full or the
    /// worker had stopped. Shared by every clone of this recorder.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl MetricsWorker {
    /// Waits until the worker has applied every queued access and exited.
    ///
    /// The worker exits once all [`MetricsRecorder`] clones are dropped.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            error!(error = %e, "metrics worker terminated abnormally");
        }
    }
}

async fn run_worker<R>(
    repository: Arc<R>,
    mut rx: mpsc::Receiver<AccessEvent>,
    max_in_flight: usize,
) where
    R: Repository + ?Sized,
{
    let permits = Arc::new(Semaphore::new(max_in_flight));
    let mut in_flight = JoinSet::new();
    debug!(max_in_flight, "metrics worker started");

    while let Some(event) = rx.recv().await {
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };

        let repository = Arc::clone(&repository);
        in_flight.spawn(async move {
            let _permit = permit;
            apply_access(repository.as_ref(), event).await;
        });

        while let Some(result) = in_flight.try_join_next() {
            log_task_result(result);
        }
    }

    while let Some(result) = in_flight.join_next().await {
        log_task_result(result);
    }
    debug!("metrics worker stopped");
}

async fn apply_access<R>(repository: &R, event: AccessEvent)
where
    R: Repository + ?Sized,
{
    let access = Access::new(event.started.elapsed(), Timestamp::now());

    match repository.record_access(&event.code, access).await {
        Ok(Some(link)) => {
            debug!(
                code = %event.code,
                clicks = link.metrics.clicks,
                avg_response_time = link.metrics.avg_response_time_secs,
                "metrics updated"
            );
        }
        Ok(None) => {
            debug!(code = %event.code, "short code no longer stored, skipping metrics update");
        }
        Err(e) => {
            let err = ShortenerError::MetricsUpdate(e);
            error!(code = %event.code, error = %err, "failed to update metrics");
        }
    }
}

fn log_task_result(result: Result<(), JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            error!(error = %e, "metrics update task panicked");
        }
    }
}
