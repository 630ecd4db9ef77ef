//! Deferred value engine plus the deterministic value model shared by planning and execution.

mod arg;
mod deferred;
mod value;

pub use arg::Arg;
pub use deferred::{Deferred, DeferredError, DeferredResult, Slot, combine, reduce};
pub use value::{Value, ValueError};

pub use alloy_primitives::{Address, B256, Bytes, U256};
