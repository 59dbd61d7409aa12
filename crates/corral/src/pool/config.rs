use crate::{DEFAULT_KEY_LENGTH, Error, Result};
use core::time::Duration;

/// Upper bound on `worker_count`.
pub const MAX_WORKERS: usize = 4096;

/// Runtime configuration for a [`Dispatcher`](crate::Dispatcher).
///
/// All fields have defaults matching the simulated driver: three connections,
/// five-character keys and 200ms of per-job latency. Values are checked once,
/// at construction, by [`validate`](Self::validate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Number of worker tasks, i.e. simulated connections. Must be `>= 1`.
    pub worker_count: usize,

    /// Length of generated correlation keys. Must be `>= 1`.
    pub key_length: usize,

    /// Simulated per-job processing latency (connection/query time).
    pub latency: Duration,

    /// Regenerate keys that are already registered instead of overwriting
    /// them. Off by default, which reproduces last-writer-wins registration.
    pub reject_collisions: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            worker_count: 3,
            key_length: DEFAULT_KEY_LENGTH,
            latency: Duration::from_millis(200),
            reject_collisions: false,
        }
    }
}

impl DispatcherConfig {
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_key_length(mut self, key_length: usize) -> Self {
        self.key_length = key_length;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_reject_collisions(mut self, reject_collisions: bool) -> Self {
        self.reject_collisions = reject_collisions;
        self
    }

    /// Rejects configurations that could never service a request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `worker_count` is `0` or above
    /// [`MAX_WORKERS`], or if `key_length` is `0`.
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(Error::InvalidConfig {
                reason: "worker_count must be greater than 0".to_string(),
            });
        }

        if self.worker_count > MAX_WORKERS {
            return Err(Error::InvalidConfig {
                reason: format!(
                    "worker_count ({}) exceeds maximum allowed ({MAX_WORKERS})",
                    self.worker_count
                ),
            });
        }

        if self.key_length == 0 {
            return Err(Error::InvalidConfig {
                reason: "key_length must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}
