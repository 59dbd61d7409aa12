//! Fixed-size worker pool and the dispatcher that feeds it.
//!
//! ## Structure
//!
//! - `config` - validated [`DispatcherConfig`].
//! - `dispatcher` - [`Dispatcher`]: registration, hand-off and shutdown.
//! - `worker` - the per-worker processing loop ([`worker_loop`]).
//! - `stats` - lock-free delivery counters ([`PoolStats`]).

mod config;
mod dispatcher;
mod stats;
mod worker;


pub use config::*;
pub use dispatcher::*;
pub use stats::*;
pub use worker::*;
