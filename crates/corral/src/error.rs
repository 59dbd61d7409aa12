//! Error types for the correlation layer.
//!
//! This module defines the central [`Error`] enum, which captures every
//! recoverable and reportable failure in the dispatcher, its workers and the
//! response slots handed to callers.
//!
//! ## Error Cases
//! - `InvalidConfig`: A [`DispatcherConfig`](crate::DispatcherConfig) failed
//!   validation at construction.
//! - `KeyNotFound`: A worker dequeued a key with no registered slot. Handled
//!   locally by the worker (logged, job dropped); never surfaced to a caller.
//! - `KeyCollision`: Collision-checked registration could not find a free key.
//! - `AlreadyDelivered`: A second delivery was attempted on a write-once slot.
//! - `SlotClosed`: The caller dropped its slot before taking the result.
//! - `Abandoned`: The producer half of a slot was dropped undelivered.
//! - `ChannelError`: An internal communication failure between tasks.
//! - `ServiceShutdown`: A request arrived after the pool was shut down.
//! - `RuntimeUnavailable`: A dispatcher was built outside a Tokio runtime.

use crate::key::CorrelationKey;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the correlation layer.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The dispatcher configuration was rejected.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// No slot is registered under the key a worker tried to deliver to.
    #[error("Key [{key}] does not exist")]
    KeyNotFound { key: CorrelationKey },

    /// Every generated key was already registered.
    #[error("No free correlation key after {attempts} attempts")]
    KeyCollision { attempts: usize },

    /// The slot has already received its single value.
    #[error("Slot already delivered")]
    AlreadyDelivered,

    /// The caller went away before taking the result.
    #[error("Slot closed by caller")]
    SlotClosed,

    /// The slot will never be delivered to.
    #[error("Slot abandoned before delivery")]
    Abandoned,

    /// Internal channel send/receive failure.
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The pool is shutting down or has shut down.
    #[error("Dispatcher is shutting down")]
    ServiceShutdown,

    /// Workers can only be spawned from within a Tokio runtime.
    #[error("No Tokio runtime available to spawn workers")]
    RuntimeUnavailable,
}
