use crate::{CorrelationKey, CorrelationRegistry, Error, PoolStats, Responder, Result};
use core::time::Duration;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Registry type shared by a dispatcher and its workers.
pub type SlotRegistry = CorrelationRegistry<Arc<Responder<String>>>;

/// A unit of work on the shared queue.
///
/// Carries only the correlation key; `accepted` fires once a worker has taken
/// the job off the queue, which is what the submitter waits on.
#[derive(Debug)]
pub struct Job {
    pub key: CorrelationKey,
    pub accepted: oneshot::Sender<()>,
}

/// Receiving end of the job queue, shared by every worker in the pool.
pub type JobQueue = Arc<Mutex<mpsc::Receiver<Job>>>;

/// Worker task servicing the shared [`JobQueue`].
///
/// Loops `wait for job -> simulate latency -> lookup -> deliver or drop` until
/// the `shutdown` token is cancelled or the queue closes. Cancellation is
/// honoured at every suspension point, including mid-latency and mid-delivery.
///
/// A key with no registered slot is logged and dropped; the loop carries on.
///
/// # Arguments
///
/// - `worker_id`: Index of this worker in `0..worker_count`. Also the value
///   delivered to callers.
/// - `queue`: Shared job queue.
/// - `registry`: Where submitters registered their slots.
/// - `latency`: Simulated per-job processing time.
/// - `stats`: Pool-wide counters.
/// - `shutdown`: Cancels the loop.
pub async fn worker_loop(
    worker_id: usize,
    queue: JobQueue,
    registry: Arc<SlotRegistry>,
    latency: Duration,
    stats: Arc<PoolStats>,
    shutdown: CancellationToken,
) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} started");

    loop {
        let job = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            job = next_job(&queue) => match job {
                Some(job) => job,
                None => break,
            },
        };

        // The submitter may have given up already; the job is still ours.
        let _ = job.accepted.send(());

        let outcome = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            outcome = process_job(worker_id, &job.key, &registry, latency) => outcome,
        };

        match outcome {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {worker_id} done job {}", job.key);
                stats.record_delivered();
            }
            Err(Error::KeyNotFound { key: _key }) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Worker {worker_id} dropped job: key [{_key}] does not exist");
                stats.record_dropped();
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Worker {worker_id} could not deliver {}: {_e}", job.key);
                stats.record_undeliverable();
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} stopped");
}

async fn next_job(queue: &JobQueue) -> Option<Job> {
    queue.lock().await.recv().await
}

/// Delivery path for a single job.
///
/// Sleeps for `latency`, takes the slot registered under `key` out of the
/// registry and hands it this worker's id. Returns once the caller has
/// received the value.
///
/// # Errors
///
/// - [`Error::KeyNotFound`] if nothing is registered under `key`. No slot is
///   touched, so a caller whose registration was lost stays blocked (or sees
///   [`Error::Abandoned`] if its responder was dropped).
/// - [`Error::SlotClosed`] / [`Error::AlreadyDelivered`] from
///   [`Responder::deliver`].
pub async fn process_job(
    worker_id: usize,
    key: &CorrelationKey,
    registry: &SlotRegistry,
    latency: Duration,
) -> Result<()> {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }

    let responder = registry
        .remove(key.as_str())
        .ok_or_else(|| Error::KeyNotFound { key: key.clone() })?;

    responder.deliver(worker_id.to_string()).await
}
