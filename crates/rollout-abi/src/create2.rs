//! Deterministic creation through a factory's `performCreate2`.
//!
//! A batched creation is wrapped in a call to the factory, and its address is
//! derived from (factory, salt, keccak(init code)) exactly as the chain will
//! assign it once the wrapped call executes.

use alloy_primitives::{Address, B256, Bytes, U256};
use rollout_values::Value;

use crate::artifact::{Mutability, Operation};
use crate::codec::decode_values;
use crate::types::{Param, ParamType};

pub const PERFORM_CREATE2_SIGNATURE: &str = "performCreate2(uint256,bytes,bytes32)";

fn perform_create2() -> Operation {
    Operation::new(
        "performCreate2",
        vec![
            Param::new("value", ParamType::Uint(256)),
            Param::new("deploymentData", ParamType::Bytes),
            Param::new("salt", ParamType::FixedBytes(32)),
        ],
        vec![Param::new("newContract", ParamType::Address)],
        Mutability::Mutate,
    )
}

pub fn salted_address(factory: Address, salt: B256, init_code: &[u8]) -> Address {
    factory.create2_from_code(salt, init_code)
}

/// Call data for `factory.performCreate2(value, init_code, salt)`. `value` is
/// paid to the new contract by the factory's caller, not by the outer call.
pub fn wrap_salted_creation(init_code: &Bytes, salt: B256, value: U256) -> Bytes {
    let args = [
        Value::Number(value),
        Value::Bytes(init_code.clone()),
        Value::from(salt),
    ];
    // Argument shapes are fixed above, so encoding cannot fail.
    perform_create2().encode_call(&args).unwrap_or_default()
}

/// Inverse of [`wrap_salted_creation`]: `(init code, salt, value)` when `data`
/// is a `performCreate2` call.
pub fn unwrap_salted_creation(data: &[u8]) -> Option<(Bytes, B256, U256)> {
    let operation = perform_create2();
    let body = data.strip_prefix(operation.selector().as_slice())?;
    let mut values = decode_values(&operation.inputs, body).ok()?.into_iter();
    let value = values.next()?.as_number().ok()?;
    let init_code = values.next()?.as_bytes().ok()?;
    let salt = values.next()?.as_bytes().ok()?;
    Some((init_code, B256::from_slice(&salt), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn matches_reference_vector() {
        // zero factory, zero salt, init code 0x00
        assert_eq!(
            salted_address(Address::ZERO, B256::ZERO, &[0x00]),
            address!("4D1A2e2bB4F88F0250f26Ffff098B0b30B26BF38")
        );
    }

    #[test]
    fn address_depends_on_every_input() {
        let factory = Address::repeat_byte(0x01);
        let salt = B256::repeat_byte(0x02);
        let base = salted_address(factory, salt, b"code");
        assert_ne!(base, salted_address(Address::repeat_byte(0x03), salt, b"code"));
        assert_ne!(base, salted_address(factory, B256::repeat_byte(0x04), b"code"));
        assert_ne!(base, salted_address(factory, salt, b"other"));
    }

    #[test]
    fn wrapped_creation_unwraps_to_its_inputs() {
        let init_code = Bytes::from(vec![0x60, 0x80, 0x60, 0x40]);
        let salt = B256::repeat_byte(0x07);
        let data = wrap_salted_creation(&init_code, salt, U256::ZERO);
        assert_eq!(&data[..4], perform_create2().selector().as_slice());
        assert_eq!(
            unwrap_salted_creation(&data),
            Some((init_code, salt, U256::ZERO))
        );
        assert_eq!(unwrap_salted_creation(&[0xde, 0xad, 0xbe, 0xef]), None);
    }

    #[test]
    fn wrapped_creation_carries_its_value() {
        let init_code = Bytes::from(vec![0x60, 0x80]);
        let salt = B256::repeat_byte(0x09);
        let value = U256::from(1_000_000_000u64);
        let data = wrap_salted_creation(&init_code, salt, value);
        let (_, _, forwarded) = unwrap_salted_creation(&data).unwrap();
        assert_eq!(forwarded, value);
    }
}
