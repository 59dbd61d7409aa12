use portable_atomic::{AtomicU64, Ordering};

/// Counters shared by the dispatcher and every worker.
///
/// All updates are relaxed; a [`StatsSnapshot`] is a best-effort view, not a
/// consistent cut across counters.
#[derive(Debug, Default)]
pub struct PoolStats {
    submitted: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
    undeliverable: AtomicU64,
}

/// Point-in-time copy of [`PoolStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Jobs handed to a worker.
    pub submitted: u64,
    /// Results taken by their caller.
    pub delivered: u64,
    /// Jobs dropped because their key had no registered slot.
    pub dropped: u64,
    /// Results whose caller was gone by delivery time.
    pub undeliverable: u64,
}

impl PoolStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_undeliverable(&self) {
        self.undeliverable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            undeliverable: self.undeliverable.load(Ordering::Relaxed),
        }
    }
}
