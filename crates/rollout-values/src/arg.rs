use alloy_primitives::{Address, B256, Bytes, U256};

use crate::deferred::{Deferred, DeferredResult};
use crate::value::Value;

/// A call or constructor argument: either known at planning time or deferred
/// until the action that produces it has run.
#[derive(Debug, Clone)]
pub enum Arg {
    Value(Value),
    Deferred(Deferred<Value>),
}

impl Arg {
    pub fn resolve(&self) -> DeferredResult<Value> {
        match self {
            Arg::Value(value) => Ok(value.clone()),
            Arg::Deferred(deferred) => deferred.resolve(),
        }
    }

    /// Resolves a whole argument list in order.
    pub fn resolve_all(args: &[Arg]) -> DeferredResult<Vec<Value>> {
        args.iter().map(Arg::resolve).collect()
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Value(value.into())
    }
}

impl From<u64> for Arg {
    fn from(value: u64) -> Self {
        Arg::Value(value.into())
    }
}

impl From<U256> for Arg {
    fn from(value: U256) -> Self {
        Arg::Value(value.into())
    }
}

impl From<Address> for Arg {
    fn from(value: Address) -> Self {
        Arg::Value(value.into())
    }
}

impl From<Bytes> for Arg {
    fn from(value: Bytes) -> Self {
        Arg::Value(value.into())
    }
}

impl From<B256> for Arg {
    fn from(value: B256) -> Self {
        Arg::Value(value.into())
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Value(value.into())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Value(value.into())
    }
}

impl From<Deferred<Value>> for Arg {
    fn from(value: Deferred<Value>) -> Self {
        Arg::Deferred(value)
    }
}

impl From<Deferred<bool>> for Arg {
    fn from(value: Deferred<bool>) -> Self {
        Arg::Deferred(value.into_value())
    }
}

impl From<Deferred<U256>> for Arg {
    fn from(value: Deferred<U256>) -> Self {
        Arg::Deferred(value.into_value())
    }
}

impl From<Deferred<Address>> for Arg {
    fn from(value: Deferred<Address>) -> Self {
        Arg::Deferred(value.into_value())
    }
}

impl From<Deferred<Bytes>> for Arg {
    fn from(value: Deferred<Bytes>) -> Self {
        Arg::Deferred(value.into_value())
    }
}

impl From<Deferred<B256>> for Arg {
    fn from(value: Deferred<B256>) -> Self {
        Arg::Deferred(value.into_value())
    }
}
