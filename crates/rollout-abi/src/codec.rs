//! Head/tail word codec for flat parameter lists.
//!
//! Static types occupy one 32-byte head word. Dynamic types (`bytes`, `string`)
//! put an offset in the head and a length-prefixed, zero-padded body in the tail.

use alloy_primitives::{Address, B256, Bytes, U256};
use rollout_values::Value;

use crate::types::{Param, ParamType};
use crate::{AbiError, AbiResult};

const WORD: usize = 32;

pub fn encode_values(params: &[Param], values: &[Value]) -> AbiResult<Vec<u8>> {
    if params.len() != values.len() {
        return Err(AbiError::ArgumentCount {
            operation: "parameter list".into(),
            expected: params.len(),
            actual: values.len(),
        });
    }
    let mut head = Vec::with_capacity(params.len() * WORD);
    let mut tail = Vec::new();
    let head_len = params.len() * WORD;

    for (position, (param, value)) in params.iter().zip(values).enumerate() {
        let label = param.label(position);
        if param.kind.is_dynamic() {
            let body = dynamic_body(&param.kind, value, &label)?;
            head.extend_from_slice(&U256::from(head_len + tail.len()).to_be_bytes::<WORD>());
            tail.extend_from_slice(&U256::from(body.len()).to_be_bytes::<WORD>());
            tail.extend_from_slice(&body);
            tail.resize(tail.len() + padding(body.len()), 0);
        } else {
            head.extend_from_slice(&static_word(&param.kind, value, &label)?);
        }
    }

    head.extend_from_slice(&tail);
    Ok(head)
}

fn padding(len: usize) -> usize {
    (WORD - len % WORD) % WORD
}

fn value_error(label: &str, source: rollout_values::ValueError) -> AbiError {
    AbiError::Value {
        param: label.to_owned(),
        source,
    }
}

fn static_word(kind: &ParamType, value: &Value, label: &str) -> AbiResult<[u8; WORD]> {
    let word = match kind {
        ParamType::Uint(bits) => {
            let number = value.as_number().map_err(|e| value_error(label, e))?;
            if *bits < 256 && !(number >> *bits).is_zero() {
                return Err(AbiError::OutOfRange {
                    param: label.to_owned(),
                    bits: *bits,
                });
            }
            number.to_be_bytes::<WORD>()
        }
        ParamType::Int(_) => value
            .as_number()
            .map_err(|e| value_error(label, e))?
            .to_be_bytes::<WORD>(),
        ParamType::Bool => {
            let flag = value.as_bool().map_err(|e| value_error(label, e))?;
            U256::from(u8::from(flag)).to_be_bytes::<WORD>()
        }
        ParamType::Address => {
            let address = value.as_address().map_err(|e| value_error(label, e))?;
            address.into_word().0
        }
        ParamType::FixedBytes(len) => {
            let bytes = value.as_bytes().map_err(|e| value_error(label, e))?;
            if bytes.len() != *len {
                return Err(AbiError::FixedBytesLength {
                    param: label.to_owned(),
                    expected: *len,
                    actual: bytes.len(),
                });
            }
            let mut word = [0u8; WORD];
            word[..*len].copy_from_slice(&bytes);
            word
        }
        ParamType::Bytes | ParamType::String => {
            return Err(AbiError::UnsupportedType(kind.to_string()));
        }
    };
    Ok(word)
}

fn dynamic_body(kind: &ParamType, value: &Value, label: &str) -> AbiResult<Vec<u8>> {
    match kind {
        ParamType::Bytes => Ok(value.as_bytes().map_err(|e| value_error(label, e))?.to_vec()),
        _ => Ok(value
            .as_text()
            .map_err(|e| value_error(label, e))?
            .as_bytes()
            .to_vec()),
    }
}

pub fn decode_values(params: &[Param], data: &[u8]) -> AbiResult<Vec<Value>> {
    params
        .iter()
        .enumerate()
        .map(|(position, param)| {
            let offset = position * WORD;
            let word = read_word(data, offset)?;
            if param.kind.is_dynamic() {
                decode_dynamic(&param.kind, data, word_to_offset(&word, offset)?)
            } else {
                decode_static(&param.kind, &word, offset)
            }
        })
        .collect()
}

fn read_word(data: &[u8], offset: usize) -> AbiResult<[u8; WORD]> {
    let slice = read_slice(data, offset, WORD)?;
    let mut word = [0u8; WORD];
    word.copy_from_slice(slice);
    Ok(word)
}

fn read_slice(data: &[u8], offset: usize, needed: usize) -> AbiResult<&[u8]> {
    offset
        .checked_add(needed)
        .and_then(|end| data.get(offset..end))
        .ok_or(AbiError::Truncated {
            offset,
            needed,
            len: data.len(),
        })
}

fn word_to_offset(word: &[u8; WORD], at: usize) -> AbiResult<usize> {
    usize::try_from(U256::from_be_bytes(*word)).map_err(|_| AbiError::InvalidWord {
        offset: at,
        kind: "offset",
    })
}

fn decode_static(kind: &ParamType, word: &[u8; WORD], offset: usize) -> AbiResult<Value> {
    let value = match kind {
        ParamType::Uint(_) | ParamType::Int(_) => Value::Number(U256::from_be_bytes(*word)),
        ParamType::Bool => match U256::from_be_bytes(*word) {
            n if n.is_zero() => Value::Bool(false),
            n if n == U256::from(1) => Value::Bool(true),
            _ => {
                return Err(AbiError::InvalidWord {
                    offset,
                    kind: "bool",
                });
            }
        },
        ParamType::Address => Value::Address(Address::from_word(B256::from(*word))),
        ParamType::FixedBytes(len) => Value::Bytes(Bytes::copy_from_slice(&word[..*len])),
        ParamType::Bytes | ParamType::String => {
            return Err(AbiError::UnsupportedType(kind.to_string()));
        }
    };
    Ok(value)
}

fn decode_dynamic(kind: &ParamType, data: &[u8], offset: usize) -> AbiResult<Value> {
    let len = word_to_offset(&read_word(data, offset)?, offset)?;
    let body = read_slice(data, offset + WORD, len)?;
    match kind {
        ParamType::Bytes => Ok(Value::Bytes(Bytes::copy_from_slice(body))),
        _ => String::from_utf8(body.to_vec())
            .map(Value::Text)
            .map_err(|_| AbiError::InvalidWord {
                offset,
                kind: "utf-8 string",
            }),
    }
}
