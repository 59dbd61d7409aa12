//! The [`Dispatcher`]: owner of the worker pool, the job queue and the
//! correlation registry.
//!
//! ## Responsibilities
//!
//! - Spawn exactly `worker_count` workers at construction.
//! - Register a fresh slot per submission and hand its key to a worker.
//! - Apply backpressure: a submission returns only once a worker took it.
//! - Tear the pool down deterministically via a shared [`CancellationToken`].

use super::worker::{Job, SlotRegistry, worker_loop};
use crate::{
    CorrelationKey, DispatcherConfig, Error, KeyGenerator, KeySource, PoolStats, Responder,
    ResponseSlot, Result, StatsSnapshot,
};
use core::time::Duration;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::timeout,
};
use tokio_util::sync::CancellationToken;

/// Attempts made by collision-checked registration before giving up.
pub const MAX_KEY_ATTEMPTS: usize = 8;

/// How long [`Dispatcher::shutdown`] waits for each worker to exit.
const WORKER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

/// Correlates submissions with results produced by a fixed pool of workers.
///
/// Each [`submit`](Self::submit) registers a one-shot slot under a generated
/// key and pushes the key onto a queue shared by all workers. Whichever worker
/// picks it up delivers its own id into that slot. No ordering is guaranteed
/// between submissions.
///
/// Must be constructed from within a Tokio runtime.
pub struct Dispatcher<K = KeyGenerator>
where
    K: KeySource,
{
    config: DispatcherConfig,
    keys: K,
    registry: Arc<SlotRegistry>,
    jobs: mpsc::Sender<Job>,
    stats: Arc<PoolStats>,
    shutdown_token: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Dispatcher<KeyGenerator> {
    /// Validates `config` and spawns the worker pool.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] if `config` does not validate.
    /// - [`Error::RuntimeUnavailable`] if called outside a Tokio runtime.
    pub fn new(config: DispatcherConfig) -> Result<Self> {
        let keys = KeyGenerator::new(config.key_length);
        Self::with_keys(config, keys)
    }
}

impl<K> Dispatcher<K>
where
    K: KeySource,
{
    /// Like [`Dispatcher::new`], with a custom [`KeySource`].
    ///
    /// `config.key_length` is only used by the default generator.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] if `config` does not validate.
    /// - [`Error::RuntimeUnavailable`] if called outside a Tokio runtime.
    pub fn with_keys(config: DispatcherConfig, keys: K) -> Result<Self> {
        config.validate()?;
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| Error::RuntimeUnavailable)?;

        let registry = Arc::new(SlotRegistry::new());
        let stats = Arc::new(PoolStats::new());
        let shutdown_token = CancellationToken::new();

        // Tokio channels need a capacity of at least one. The hand-off stays
        // unbuffered from the submitter's point of view because `submit` waits
        // for a worker to accept the job.
        let (jobs, rx) = mpsc::channel(1);
        let queue = Arc::new(tokio::sync::Mutex::new(rx));

        let workers = (0..config.worker_count)
            .map(|worker_id| {
                runtime.spawn(worker_loop(
                    worker_id,
                    Arc::clone(&queue),
                    Arc::clone(&registry),
                    config.latency,
                    Arc::clone(&stats),
                    shutdown_token.clone(),
                ))
            })
            .collect();

        #[cfg(feature = "tracing")]
        tracing::debug!("Spawned {} workers", config.worker_count);

        Ok(Self {
            config,
            keys,
            registry,
            jobs,
            stats,
            shutdown_token,
            workers: Mutex::new(workers),
        })
    }

    /// Submits a job and returns the slot its result will be delivered to.
    ///
    /// Blocks until a worker has taken the job off the queue, so at most
    /// `worker_count` jobs are in flight at once. Read the result with
    /// [`ResponseSlot::recv`].
    ///
    /// With `reject_collisions` off, a key collision silently replaces the
    /// earlier registration; that earlier caller then sees
    /// [`Error::Abandoned`].
    ///
    /// # Errors
    ///
    /// - [`Error::ServiceShutdown`] if the pool is shutting down.
    /// - [`Error::KeyCollision`] if collision-checked registration found no
    ///   free key.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
    pub async fn submit(&self) -> Result<ResponseSlot<String>> {
        if self.shutdown_token.is_cancelled() {
            return Err(Error::ServiceShutdown);
        }

        let (responder, slot) = ResponseSlot::channel();
        let responder = Arc::new(responder);
        let key = self.register(Arc::clone(&responder))?;
        // Unregisters on every exit that did not hand the job to a worker,
        // including this future being dropped mid hand-off.
        let mut registration = Registration {
            registry: &self.registry,
            key: key.clone(),
            responder: Arc::downgrade(&responder),
            handed_off: false,
        };
        drop(responder);

        let (accepted_tx, accepted_rx) = oneshot::channel();
        let job = Job {
            key: key.clone(),
            accepted: accepted_tx,
        };

        let handed_off = tokio::select! {
            biased;
            () = self.shutdown_token.cancelled() => false,
            sent = self.enqueue(job, accepted_rx) => sent,
        };

        if !handed_off {
            return Err(Error::ServiceShutdown);
        }

        registration.handed_off = true;
        self.stats.record_submitted();
        Ok(slot)
    }

    async fn enqueue(&self, job: Job, accepted: oneshot::Receiver<()>) -> bool {
        if self.jobs.send(job).await.is_err() {
            return false;
        }
        accepted.await.is_ok()
    }

    fn register(&self, responder: Arc<Responder<String>>) -> Result<CorrelationKey> {
        if !self.config.reject_collisions {
            let key = self.keys.generate();
            self.registry.set(key.clone(), responder);
            return Ok(key);
        }

        for _ in 0..MAX_KEY_ATTEMPTS {
            let key = self.keys.generate();
            if self
                .registry
                .insert_if_vacant(key.clone(), Arc::clone(&responder))
            {
                return Ok(key);
            }

            #[cfg(feature = "tracing")]
            tracing::debug!("Key [{key}] already registered, regenerating");
        }

        Err(Error::KeyCollision {
            attempts: MAX_KEY_ATTEMPTS,
        })
    }

    /// Shared registry of slots awaiting delivery.
    pub fn registry(&self) -> &Arc<SlotRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn worker_count(&self) -> usize {
        self.config.worker_count
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Stops every worker and releases every pending slot.
    ///
    /// - Cancels the shared [`CancellationToken`] so no new work is accepted
    ///   and in-flight jobs stop at their next suspension point.
    /// - Waits (up to 3 seconds per worker) for each worker task to exit.
    /// - Clears the registry, so callers still waiting see
    ///   [`Error::Abandoned`].
    ///
    /// Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelError`] if a worker panicked or did not stop in
    /// time.
    pub async fn shutdown(&self) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::debug!("Cancelling workers via shutdown token");
        self.shutdown_token.cancel();

        let handles = core::mem::take(&mut *self.workers.lock());
        let joins = handles.into_iter().enumerate().map(|(i, handle)| async move {
            match timeout(WORKER_SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(Error::ChannelError {
                    context: format!("Worker {i} failed: {e}"),
                }),
                Err(_) => Err(Error::ChannelError {
                    context: format!("Worker {i} shutdown timed out"),
                }),
            }
        });
        let results = futures::future::join_all(joins).await;

        self.registry.clear();

        #[cfg(feature = "tracing")]
        tracing::info!("Worker pool shutdown complete");

        results.into_iter().collect()
    }
}

/// A registry entry owned by an in-progress [`Dispatcher::submit`].
struct Registration<'a> {
    registry: &'a SlotRegistry,
    key: CorrelationKey,
    responder: Weak<Responder<String>>,
    handed_off: bool,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        if self.handed_off {
            return;
        }
        // A colliding submit may have replaced the entry; leave theirs alone.
        self.registry.remove_if(self.key.as_str(), |current| {
            core::ptr::eq(Arc::as_ptr(current), self.responder.as_ptr())
        });
    }
}

impl<K> Drop for Dispatcher<K>
where
    K: KeySource,
{
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration<'a>(
        registry: &'a SlotRegistry,
        responder: &Arc<Responder<String>>,
    ) -> Registration<'a> {
        Registration {
            registry,
            key: CorrelationKey::from("k"),
            responder: Arc::downgrade(responder),
            handed_off: false,
        }
    }

    #[test]
    fn dropped_registration_removes_own_entry() {
        let registry = SlotRegistry::new();
        let (responder, _slot) = ResponseSlot::channel();
        let responder = Arc::new(responder);
        registry.set(CorrelationKey::from("k"), Arc::clone(&responder));

        drop(registration(&registry, &responder));
        assert!(registry.is_empty());
    }

    #[test]
    fn dropped_registration_keeps_replacement_entry() {
        let registry = SlotRegistry::new();
        let (ours, _ours_slot) = ResponseSlot::channel();
        let (theirs, _theirs_slot) = ResponseSlot::channel();
        let ours = Arc::new(ours);
        let theirs = Arc::new(theirs);
        registry.set(CorrelationKey::from("k"), Arc::clone(&theirs));

        drop(registration(&registry, &ours));
        assert!(Arc::ptr_eq(&registry.get("k").unwrap(), &theirs));
    }

    #[test]
    fn handed_off_registration_is_kept() {
        let registry = SlotRegistry::new();
        let (responder, _slot) = ResponseSlot::channel();
        let responder = Arc::new(responder);
        registry.set(CorrelationKey::from("k"), Arc::clone(&responder));

        let mut reg = registration(&registry, &responder);
        reg.handed_off = true;
        drop(reg);
        assert_eq!(registry.len(), 1);
    }
}
