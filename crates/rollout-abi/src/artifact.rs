use std::{fs, path::Path};

use alloy_primitives::{B256, Bytes, keccak256};
use indexmap::IndexMap;
use rollout_values::Value;
use serde::Deserialize;

use crate::codec::{decode_values, encode_values};
use crate::fingerprint::code_fingerprint;
use crate::types::Param;
use crate::{AbiError, AbiResult};

/// Whether invoking an operation changes remote state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    Read,
    Mutate,
}

/// One entry of a resource kind's operation table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
    pub mutability: Mutability,
}

impl Operation {
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<Param>,
        outputs: Vec<Param>,
        mutability: Mutability,
    ) -> Self {
        Self {
            name: name.into(),
            inputs,
            outputs,
            mutability,
        }
    }

    /// Canonical signature, e.g. `transfer(address,uint256)`.
    pub fn signature(&self) -> String {
        let types: Vec<String> = self.inputs.iter().map(|p| p.kind.to_string()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    pub fn selector(&self) -> [u8; 4] {
        let digest = keccak256(self.signature().as_bytes());
        [digest[0], digest[1], digest[2], digest[3]]
    }

    pub fn encode_call(&self, args: &[Value]) -> AbiResult<Bytes> {
        if args.len() != self.inputs.len() {
            return Err(AbiError::ArgumentCount {
                operation: self.signature(),
                expected: self.inputs.len(),
                actual: args.len(),
            });
        }
        let mut data = self.selector().to_vec();
        data.extend(encode_values(&self.inputs, args)?);
        Ok(data.into())
    }

    /// No outputs decode to `Unit`, a single output to its value and several
    /// outputs to a record keyed by output name (or position when unnamed).
    pub fn decode_output(&self, data: &[u8]) -> AbiResult<Value> {
        let mut values = decode_values(&self.outputs, data)?;
        match values.len() {
            0 => Ok(Value::Unit),
            1 => Ok(values.remove(0)),
            _ => Ok(Value::record(
                self.outputs
                    .iter()
                    .enumerate()
                    .map(|(idx, param)| param.label(idx))
                    .zip(values),
            )),
        }
    }
}

/// Interface table plus creation template for one resource kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    name: String,
    constructor: Vec<Param>,
    operations: IndexMap<String, Operation>,
    bytecode: Bytes,
    deployed_bytecode: Bytes,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    #[serde(default)]
    contract_name: Option<String>,
    abi: Vec<RawAbiItem>,
    #[serde(default)]
    bytecode: String,
    #[serde(default)]
    deployed_bytecode: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAbiItem {
    #[serde(rename = "type", default = "default_item_kind")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<Param>,
    #[serde(default)]
    outputs: Vec<Param>,
    #[serde(default)]
    state_mutability: Option<String>,
    #[serde(default)]
    constant: Option<bool>,
}

fn default_item_kind() -> String {
    "function".into()
}

impl RawAbiItem {
    fn mutability(&self) -> Mutability {
        match self.state_mutability.as_deref() {
            Some("view" | "pure") => Mutability::Read,
            Some(_) => Mutability::Mutate,
            None if self.constant == Some(true) => Mutability::Read,
            None => Mutability::Mutate,
        }
    }
}

fn decode_hex(field: &'static str, raw: &str) -> AbiResult<Bytes> {
    let trimmed = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(trimmed)
        .map(Bytes::from)
        .map_err(|source| AbiError::Hex { field, source })
}

impl Artifact {
    pub fn builder(name: impl Into<String>) -> ArtifactBuilder {
        ArtifactBuilder {
            artifact: Artifact {
                name: name.into(),
                constructor: Vec::new(),
                operations: IndexMap::new(),
                bytecode: Bytes::new(),
                deployed_bytecode: Bytes::new(),
            },
        }
    }

    /// Parses a compiler artifact (`abi`, `bytecode`, `deployedBytecode`).
    ///
    /// `name` is used unless the document carries its own `contractName`.
    pub fn from_json(name: &str, json: &str) -> AbiResult<Self> {
        let raw: RawArtifact = serde_json::from_str(json)?;
        Self::from_raw(name, raw)
    }

    pub fn from_value(name: &str, json: serde_json::Value) -> AbiResult<Self> {
        let raw: RawArtifact = serde_json::from_value(json)?;
        Self::from_raw(name, raw)
    }

    /// Loads an artifact file; the kind name defaults to the file stem.
    pub fn load(path: impl AsRef<Path>) -> AbiResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| AbiError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        Self::from_json(stem, &json)
    }

    fn from_raw(name: &str, raw: RawArtifact) -> AbiResult<Self> {
        let mut builder = Artifact::builder(raw.contract_name.as_deref().unwrap_or(name))
            .bytecode(decode_hex("bytecode", &raw.bytecode)?)
            .deployed_bytecode(decode_hex("deployedBytecode", &raw.deployed_bytecode)?);
        for item in raw.abi {
            match item.kind.as_str() {
                "constructor" => builder = builder.constructor(item.inputs),
                "function" => {
                    let mutability = item.mutability();
                    builder = builder.operation(Operation::new(
                        item.name,
                        item.inputs,
                        item.outputs,
                        mutability,
                    ));
                }
                // events, errors, fallback and receive entries carry no callable surface
                _ => {}
            }
        }
        Ok(builder.build())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default logical resource name: the kind with its first letter lower-cased.
    pub fn default_resource_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn constructor(&self) -> &[Param] {
        &self.constructor
    }

    pub fn bytecode(&self) -> &Bytes {
        &self.bytecode
    }

    pub fn deployed_bytecode(&self) -> &Bytes {
        &self.deployed_bytecode
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.values()
    }

    /// Looks up an operation by plain name, or by full signature for overloads.
    pub fn operation(&self, name: &str) -> AbiResult<&Operation> {
        if let Some(operation) = self.operations.get(name) {
            return Ok(operation);
        }
        let candidates: Vec<&Operation> = self
            .operations
            .values()
            .filter(|operation| operation.name == name)
            .collect();
        match candidates.as_slice() {
            [single] => Ok(single),
            [] => Err(AbiError::UnknownOperation {
                artifact: self.name.clone(),
                operation: name.to_owned(),
            }),
            many => Err(AbiError::AmbiguousOperation {
                artifact: self.name.clone(),
                operation: name.to_owned(),
                candidates: many.iter().map(|op| op.signature()).collect(),
            }),
        }
    }

    pub fn encode_constructor_args(&self, args: &[Value]) -> AbiResult<Bytes> {
        if args.len() != self.constructor.len() {
            return Err(AbiError::ArgumentCount {
                operation: format!("{} constructor", self.name),
                expected: self.constructor.len(),
                actual: args.len(),
            });
        }
        Ok(encode_values(&self.constructor, args)?.into())
    }

    /// Creation code followed by the encoded constructor arguments.
    pub fn creation_payload(&self, args: &[Value]) -> AbiResult<Bytes> {
        let encoded = self.encode_constructor_args(args)?;
        let mut payload = self.bytecode.to_vec();
        payload.extend_from_slice(&encoded);
        Ok(payload.into())
    }

    /// Fingerprint of the runtime code this kind deploys.
    pub fn code_fingerprint(&self) -> B256 {
        code_fingerprint(&self.deployed_bytecode)
    }
}

pub struct ArtifactBuilder {
    artifact: Artifact,
}

impl ArtifactBuilder {
    pub fn bytecode(mut self, bytecode: impl Into<Bytes>) -> Self {
        self.artifact.bytecode = bytecode.into();
        self
    }

    pub fn deployed_bytecode(mut self, code: impl Into<Bytes>) -> Self {
        self.artifact.deployed_bytecode = code.into();
        self
    }

    pub fn constructor(mut self, params: Vec<Param>) -> Self {
        self.artifact.constructor = params;
        self
    }

    /// Operations are keyed by name; an overload moves both entries to signature keys.
    pub fn operation(mut self, operation: Operation) -> Self {
        let operations = &mut self.artifact.operations;
        if let Some(existing) = operations.shift_remove(&operation.name) {
            operations.insert(existing.signature(), existing);
            operations.insert(operation.signature(), operation);
        } else if operations.values().any(|op| op.name == operation.name) {
            operations.insert(operation.signature(), operation);
        } else {
            operations.insert(operation.name.clone(), operation);
        }
        self
    }

    pub fn build(self) -> Artifact {
        self.artifact
    }
}
