use std::fmt;

use alloy_primitives::{Address, Bytes, U256};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Deterministic value representation passed between actions.
///
/// Call arguments, decoded call results and annotation payloads all travel as
/// `Value`s; typed deferred views (`Deferred<U256>`, `Deferred<bool>`, ...) are
/// projections over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Value {
    #[default]
    Unit,
    Bool(bool),
    Number(U256),
    Address(Address),
    Bytes(Bytes),
    Text(String),
    List(Vec<Value>),
    Record(IndexMap<String, Value>),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("type error: expected {expected}, got {actual}")]
    TypeError {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("missing field '{0}'")]
    MissingField(String),
    #[error("index {index} out of bounds for list of length {len}")]
    OutOfBounds { index: usize, len: usize },
}

impl Value {
    /// Human-readable kind string used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Address(_) => "address",
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }

    /// Convenience helper to build a record from field/value pairs.
    pub fn record(fields: impl IntoIterator<Item = (impl Into<String>, Value)>) -> Self {
        let mut map = IndexMap::new();
        for (key, value) in fields.into_iter() {
            map.insert(key.into(), value);
        }
        Value::Record(map)
    }

    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match self {
            Value::Bool(value) => Ok(*value),
            other => Err(type_error("bool", other)),
        }
    }

    pub fn as_number(&self) -> Result<U256, ValueError> {
        match self {
            Value::Number(value) => Ok(*value),
            other => Err(type_error("number", other)),
        }
    }

    /// Addresses also accept a 32-byte word holding a left-padded address, which is
    /// what raw storage reads return.
    pub fn as_address(&self) -> Result<Address, ValueError> {
        match self {
            Value::Address(value) => Ok(*value),
            Value::Bytes(bytes) if bytes.len() == 20 => Ok(Address::from_slice(bytes)),
            Value::Bytes(bytes) if bytes.len() == 32 => Ok(Address::from_slice(&bytes[12..])),
            other => Err(type_error("address", other)),
        }
    }

    pub fn as_bytes(&self) -> Result<Bytes, ValueError> {
        match self {
            Value::Bytes(value) => Ok(value.clone()),
            other => Err(type_error("bytes", other)),
        }
    }

    pub fn as_text(&self) -> Result<&str, ValueError> {
        match self {
            Value::Text(value) => Ok(value),
            other => Err(type_error("text", other)),
        }
    }

    /// Project a named field out of a record.
    pub fn field(&self, name: &str) -> Result<Value, ValueError> {
        match self {
            Value::Record(fields) => fields
                .get(name)
                .cloned()
                .ok_or_else(|| ValueError::MissingField(name.to_owned())),
            other => Err(type_error("record", other)),
        }
    }

    /// Positional projection over lists and records (records keep declaration order).
    pub fn index(&self, index: usize) -> Result<Value, ValueError> {
        match self {
            Value::List(items) => items.get(index).cloned().ok_or(ValueError::OutOfBounds {
                index,
                len: items.len(),
            }),
            Value::Record(fields) => fields
                .get_index(index)
                .map(|(_, value)| value.clone())
                .ok_or(ValueError::OutOfBounds {
                    index,
                    len: fields.len(),
                }),
            other => Err(type_error("list", other)),
        }
    }
}

fn type_error(expected: &'static str, actual: &Value) -> ValueError {
    ValueError::TypeError {
        expected,
        actual: actual.kind(),
    }
}

/// Renders values for annotations: scalars inline, records field by field.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => f.write_str("()"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Number(value) => write!(f, "{value}"),
            Value::Address(value) => write!(f, "{value}"),
            Value::Bytes(value) => write!(f, "{value}"),
            Value::Text(value) => f.write_str(value),
            Value::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Record(fields) => {
                f.write_str("{")?;
                for (idx, (key, value)) in fields.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "\n  {key}: {value}")?;
                }
                if !fields.is_empty() {
                    f.write_str("\n")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(U256::from(value))
    }
}

impl From<U256> for Value {
    fn from(value: U256) -> Self {
        Value::Number(value)
    }
}

impl From<Address> for Value {
    fn from(value: Address) -> Self {
        Value::Address(value)
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Bytes(value)
    }
}

impl From<alloy_primitives::B256> for Value {
    fn from(value: alloy_primitives::B256) -> Self {
        Value::Bytes(Bytes::copy_from_slice(value.as_slice()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}
