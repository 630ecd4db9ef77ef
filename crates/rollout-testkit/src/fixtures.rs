//! Artifact fixtures and a chain pre-loaded with them.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256, address};
use rollout_abi::{Artifact, Mutability, Operation, Param, ParamType};
use rollout_values::Value;

use crate::chain::{ContractState, Handler, Invocation, MockChain, field_store};

/// Salted-creation factory pre-registered on [`chain`].
pub const FACTORY: Address = address!("00000000000000000000000000000000000fac70");
/// Approving account used by [`crate::MockApprovals`] in the fixtures.
pub const SAFE: Address = address!("0000000000000000000000000000000000005afe");
pub const NETWORK: &str = "net";

const TOKEN_JSON: &str = include_str!("../fixtures/Token.json");
const CREATION_PREFIX: &str = "6080604052348015600f57600080fd5b50";
const RUNTIME_PREFIX: &str = "6080604052600436106100";

fn code(hex_str: &str) -> Bytes {
    Bytes::from(hex::decode(hex_str).expect("fixture bytecode is valid hex"))
}

fn creation(tag: &str) -> Bytes {
    code(&format!("{CREATION_PREFIX}{tag}"))
}

fn runtime(tag: &str) -> Bytes {
    code(&format!("{RUNTIME_PREFIX}{tag}"))
}

fn read(name: &str, output: ParamType) -> Operation {
    Operation::new(name, vec![], vec![Param::new("", output)], Mutability::Read)
}

fn write(name: &str, inputs: Vec<Param>) -> Operation {
    Operation::new(name, inputs, vec![], Mutability::Mutate)
}

/// `Token`, parsed from a compiler artifact. No constructor arguments.
pub fn token() -> Arc<Artifact> {
    Arc::new(Artifact::from_json("Token", TOKEN_JSON).expect("token fixture parses"))
}

/// `Token` whose runtime code differs only in its metadata trailer.
pub fn token_recompiled() -> Arc<Artifact> {
    let json = TOKEN_JSON.replace("aaaaaaaa", "bbbbbbbb");
    Arc::new(Artifact::from_json("Token", &json).expect("token fixture parses"))
}

/// `Token` with different runtime code.
pub fn token_v2() -> Arc<Artifact> {
    let json = TOKEN_JSON
        .replace("0x6080604052600436", "0x6080604052600536")
        .replace("5b5060010001\"", "5b5060010002\"");
    Arc::new(Artifact::from_json("Token", &json).expect("token fixture parses"))
}

/// `Counter(uint256 value)` with `value()`, `setValue(uint256)` and `increment()`.
pub fn counter() -> Arc<Artifact> {
    Arc::new(
        Artifact::builder("Counter")
            .bytecode(creation("0003"))
            .deployed_bytecode(runtime("030000"))
            .constructor(vec![Param::new("value", ParamType::Uint(256))])
            .operation(read("value", ParamType::Uint(256)))
            .operation(write(
                "setValue",
                vec![Param::new("value", ParamType::Uint(256))],
            ))
            .operation(write("increment", vec![]))
            .build(),
    )
}

/// Forwarding resource: `implementation()` and `upgradeTo(address)`.
pub fn proxy() -> Arc<Artifact> {
    Arc::new(
        Artifact::builder("Proxy")
            .bytecode(creation("0004"))
            .deployed_bytecode(runtime("040000"))
            .operation(read("implementation", ParamType::Address))
            .operation(write(
                "upgradeTo",
                vec![Param::new("implementation", ParamType::Address)],
            ))
            .build(),
    )
}

fn implementation_kind(tag: &str) -> Arc<Artifact> {
    Arc::new(
        Artifact::builder("Implementation")
            .bytecode(creation(tag))
            .deployed_bytecode(runtime(&format!("{tag}00")))
            .operation(write(
                "initialize",
                vec![Param::new("owner", ParamType::Address)],
            ))
            .operation(read("owner", ParamType::Address))
            .operation(read("version", ParamType::Uint(256)))
            .build(),
    )
}

/// Logic behind [`proxy`]: `initialize(address owner)`, `owner()`, `version()`.
pub fn implementation() -> Arc<Artifact> {
    implementation_kind("0005")
}

pub fn implementation_v2() -> Arc<Artifact> {
    implementation_kind("0006")
}

fn counter_handler() -> Handler {
    let store = field_store();
    Arc::new(move |state: &mut ContractState, call: &Invocation<'_>| {
        if call.operation == "increment" {
            let current = state
                .get("value")
                .map(Value::as_number)
                .transpose()
                .map_err(|err| err.to_string())?
                .unwrap_or_default();
            state.insert("value".into(), Value::from(current + U256::from(1)));
            return Ok(Value::Unit);
        }
        store(state, call)
    })
}

fn token_handler() -> Handler {
    let store = field_store();
    Arc::new(move |state: &mut ContractState, call: &Invocation<'_>| match call.operation {
        "constructor" => {
            state.insert("owner".into(), Value::from(call.sender));
            Ok(Value::Unit)
        }
        "mint" => {
            let amount = call.args[0].as_number().map_err(|err| err.to_string())?;
            let supply = state
                .get("totalSupply")
                .map(Value::as_number)
                .transpose()
                .map_err(|err| err.to_string())?
                .unwrap_or_default();
            state.insert("totalSupply".into(), Value::from(supply + amount));
            Ok(Value::Unit)
        }
        _ => store(state, call),
    })
}

fn implementation_handler(version: u64) -> Handler {
    let store = field_store();
    Arc::new(move |state: &mut ContractState, call: &Invocation<'_>| match call.operation {
        "version" => Ok(Value::from(version)),
        "initialize" if state.contains_key("owner") => Err("already initialized".into()),
        _ => store(state, call),
    })
}

/// A [`MockChain`] with every fixture kind registered and [`FACTORY`] in place.
pub fn chain() -> Arc<MockChain> {
    let chain = MockChain::new();
    chain.register_with(&token(), token_handler());
    chain.register_with(&token_v2(), token_handler());
    chain.register_with(&counter(), counter_handler());
    chain.register(&proxy());
    chain.register_with(&implementation(), implementation_handler(1));
    chain.register_with(&implementation_v2(), implementation_handler(2));
    chain.add_factory(FACTORY);
    Arc::new(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollout_abi::same_code;

    #[test]
    fn token_artifact_parses_its_interface() {
        let token = token();
        assert_eq!(token.name(), "Token");
        assert!(token.constructor().is_empty());
        assert_eq!(token.operation("owner").unwrap().mutability, Mutability::Read);
        assert_eq!(token.operation("mint").unwrap().mutability, Mutability::Mutate);
        assert!(token.operation("Transfer").is_err());
    }

    #[test]
    fn recompiled_token_keeps_its_fingerprint() {
        let (original, recompiled) = (token(), token_recompiled());
        assert_ne!(original.deployed_bytecode(), recompiled.deployed_bytecode());
        assert!(same_code(original.deployed_bytecode(), recompiled.deployed_bytecode()));
        assert_ne!(original.code_fingerprint(), token_v2().code_fingerprint());
    }

    #[test]
    fn creation_codes_do_not_shadow_each_other() {
        let kinds = [token(), token_v2(), counter(), proxy(), implementation(), implementation_v2()];
        for (i, left) in kinds.iter().enumerate() {
            for right in kinds.iter().skip(i + 1) {
                assert!(!left.bytecode().starts_with(right.bytecode()));
                assert!(!right.bytecode().starts_with(left.bytecode()));
            }
        }
    }
}
