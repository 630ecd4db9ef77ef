use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{AbiError, AbiResult};

/// Elementary parameter types understood by the codec.
///
/// Signed integers travel as raw two's complement words; the codec does not
/// interpret the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Uint(usize),
    Int(usize),
    Bool,
    Address,
    FixedBytes(usize),
    Bytes,
    String,
}

impl ParamType {
    pub fn parse(raw: &str) -> AbiResult<Self> {
        let unsupported = || AbiError::UnsupportedType(raw.to_owned());
        let parsed = match raw {
            "bool" => ParamType::Bool,
            "address" => ParamType::Address,
            "bytes" => ParamType::Bytes,
            "string" => ParamType::String,
            "uint" => ParamType::Uint(256),
            "int" => ParamType::Int(256),
            _ => {
                if let Some(bits) = raw.strip_prefix("uint") {
                    ParamType::Uint(parse_bits(bits).ok_or_else(unsupported)?)
                } else if let Some(bits) = raw.strip_prefix("int") {
                    ParamType::Int(parse_bits(bits).ok_or_else(unsupported)?)
                } else if let Some(len) = raw.strip_prefix("bytes") {
                    let len: usize = len.parse().map_err(|_| unsupported())?;
                    if !(1..=32).contains(&len) {
                        return Err(unsupported());
                    }
                    ParamType::FixedBytes(len)
                } else {
                    return Err(unsupported());
                }
            }
        };
        Ok(parsed)
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, ParamType::Bytes | ParamType::String)
    }
}

fn parse_bits(raw: &str) -> Option<usize> {
    let bits: usize = raw.parse().ok()?;
    (bits > 0 && bits <= 256 && bits % 8 == 0).then_some(bits)
}

/// Canonical spelling used in signatures (`uint256`, `bytes32`, ...).
impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Uint(bits) => write!(f, "uint{bits}"),
            ParamType::Int(bits) => write!(f, "int{bits}"),
            ParamType::Bool => f.write_str("bool"),
            ParamType::Address => f.write_str("address"),
            ParamType::FixedBytes(len) => write!(f, "bytes{len}"),
            ParamType::Bytes => f.write_str("bytes"),
            ParamType::String => f.write_str("string"),
        }
    }
}

impl Serialize for ParamType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ParamType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ParamType::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A named parameter of a constructor or operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParamType,
}

impl Param {
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Name used in error messages and record keys; falls back to the position.
    pub(crate) fn label(&self, position: usize) -> String {
        if self.name.is_empty() {
            position.to_string()
        } else {
            self.name.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_elementary_types() {
        assert_eq!(ParamType::parse("uint").unwrap(), ParamType::Uint(256));
        assert_eq!(ParamType::parse("uint8").unwrap(), ParamType::Uint(8));
        assert_eq!(ParamType::parse("int128").unwrap(), ParamType::Int(128));
        assert_eq!(ParamType::parse("bytes4").unwrap(), ParamType::FixedBytes(4));
        assert_eq!(ParamType::parse("bytes").unwrap(), ParamType::Bytes);
        assert_eq!(ParamType::parse("address").unwrap(), ParamType::Address);
    }

    #[test]
    fn rejects_composite_and_malformed_types() {
        for raw in ["uint7", "uint512", "bytes33", "bytes0", "address[]", "tuple"] {
            assert!(
                matches!(ParamType::parse(raw), Err(AbiError::UnsupportedType(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn canonical_spelling_round_trips() {
        let param: Param = serde_json::from_str(r#"{"name":"owner","type":"uint"}"#).unwrap();
        assert_eq!(param.kind.to_string(), "uint256");
        assert_eq!(
            serde_json::to_value(&param).unwrap(),
            serde_json::json!({"name": "owner", "type": "uint256"})
        );
    }
}
