#![doc = include_str!("../README.md")]

mod error;
mod key;
mod pool;
mod registry;
mod slot;

pub use crate::error::*;
pub use crate::key::*;
pub use crate::pool::*;
pub use crate::registry::*;
pub use crate::slot::*;
