use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, B256, Bytes, U256};
use rollout_abi::{Artifact, Operation};
use rollout_values::{Arg, Deferred, DeferredResult, Slot, Value};

use crate::plan::Resource;

/// Per-action replacements for the estimated fee and the attached value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOverrides {
    pub gas_limit: Option<u64>,
    pub gas_price: Option<U256>,
    pub value: Option<U256>,
}

#[derive(Debug, Clone)]
pub struct CreateAction {
    pub artifact: Arc<Artifact>,
    pub name: String,
    pub args: Vec<Arg>,
    /// Reuse any recorded address without comparing code.
    pub skip_upgrade: bool,
    pub overrides: TxOverrides,
    pub batch: Option<String>,
    pub address: Slot<Address>,
}

#[derive(Debug, Clone)]
pub struct CallAction {
    pub resource: String,
    pub target: Deferred<Address>,
    pub operation: Operation,
    pub args: Vec<Arg>,
    pub overrides: TxOverrides,
    pub batch: Option<String>,
    pub result: Slot<Value>,
}

#[derive(Debug, Clone)]
pub struct EncodeAction {
    pub operation: Operation,
    pub args: Vec<Arg>,
    pub result: Slot<Bytes>,
}

#[derive(Debug, Clone)]
pub struct StorageAction {
    pub target: Deferred<Address>,
    pub key: B256,
    pub result: Slot<Bytes>,
}

/// One piece of an annotation line.
#[derive(Debug, Clone)]
pub enum Note {
    Text(String),
    Value(Deferred<Value>),
    Resource {
        kind: String,
        address: Deferred<Address>,
    },
}

impl Note {
    /// Resources render as `Kind#address`, records field by field.
    pub fn render(&self) -> DeferredResult<String> {
        Ok(match self {
            Note::Text(text) => text.clone(),
            Note::Value(value) => value.resolve()?.to_string(),
            Note::Resource { kind, address } => format!("{kind}#{}", address.resolve()?),
        })
    }
}

impl From<&str> for Note {
    fn from(text: &str) -> Self {
        Note::Text(text.to_owned())
    }
}

impl From<String> for Note {
    fn from(text: String) -> Self {
        Note::Text(text)
    }
}

impl From<Value> for Note {
    fn from(value: Value) -> Self {
        Note::Value(Deferred::ready(value))
    }
}

impl From<Deferred<Value>> for Note {
    fn from(value: Deferred<Value>) -> Self {
        Note::Value(value)
    }
}

impl From<Deferred<U256>> for Note {
    fn from(value: Deferred<U256>) -> Self {
        Note::Value(value.into_value())
    }
}

impl From<Deferred<bool>> for Note {
    fn from(value: Deferred<bool>) -> Self {
        Note::Value(value.into_value())
    }
}

impl From<Deferred<Address>> for Note {
    fn from(value: Deferred<Address>) -> Self {
        Note::Value(value.into_value())
    }
}

impl From<Deferred<Bytes>> for Note {
    fn from(value: Deferred<Bytes>) -> Self {
        Note::Value(value.into_value())
    }
}

impl From<&Resource> for Note {
    fn from(resource: &Resource) -> Self {
        Note::Resource {
            kind: resource.artifact().name().to_owned(),
            address: resource.address(),
        }
    }
}

/// One recorded plan step. Append-only and immutable once recorded.
#[derive(Debug, Clone)]
pub enum Action {
    Create(CreateAction),
    Read(CallAction),
    Mutate(CallAction),
    Encode(EncodeAction),
    ReadStorage(StorageAction),
    ConditionalStart(Deferred<bool>),
    ConditionalEnd,
    BatchStart(String),
    BatchEnd(String),
    Annotate(Vec<Note>),
    RecordExisting {
        name: String,
        address: Deferred<Address>,
    },
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Create(_) => "create",
            Action::Read(_) => "read",
            Action::Mutate(_) => "mutate",
            Action::Encode(_) => "encode",
            Action::ReadStorage(_) => "read-storage",
            Action::ConditionalStart(_) => "conditional-start",
            Action::ConditionalEnd => "conditional-end",
            Action::BatchStart(_) => "batch-start",
            Action::BatchEnd(_) => "batch-end",
            Action::Annotate(_) => "annotate",
            Action::RecordExisting { .. } => "record-existing",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create(create) => write!(f, "create {}", create.name),
            Action::Read(call) | Action::Mutate(call) => {
                write!(f, "{} {}.{}", self.kind(), call.resource, call.operation.name)
            }
            Action::Encode(encode) => write!(f, "encode {}", encode.operation.name),
            Action::BatchStart(name) | Action::BatchEnd(name) => {
                write!(f, "{} {name}", self.kind())
            }
            Action::RecordExisting { name, .. } => write!(f, "record-existing {name}"),
            other => f.write_str(other.kind()),
        }
    }
}

/// Suppression depth after `action` when it is reached at `depth`.
///
/// A `ConditionalStart` reached at depth zero resolves its condition: false
/// opens a suppressed region. Inside a suppressed region brackets only nest,
/// so an inner condition is never consulted.
pub fn next_depth(depth: usize, action: &Action) -> DeferredResult<usize> {
    Ok(match (depth, action) {
        (0, Action::ConditionalStart(condition)) => usize::from(!condition.resolve()?),
        (depth, Action::ConditionalStart(_)) => depth + 1,
        (0, Action::ConditionalEnd) => 0,
        (depth, Action::ConditionalEnd) => depth - 1,
        (depth, _) => depth,
    })
}
