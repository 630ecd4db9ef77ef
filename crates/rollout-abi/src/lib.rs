//! Contract interface tables, the word-aligned call/creation payload codec, runtime code
//! fingerprints and the salted (create2) address formula.

mod artifact;
mod codec;
mod create2;
mod fingerprint;
mod types;

pub use artifact::{Artifact, ArtifactBuilder, Mutability, Operation};
pub use codec::{decode_values, encode_values};
pub use create2::{
    PERFORM_CREATE2_SIGNATURE, salted_address, unwrap_salted_creation, wrap_salted_creation,
};
pub use fingerprint::{code_fingerprint, same_code};
pub use types::{Param, ParamType};

use rollout_values::ValueError;
use std::{io, path::PathBuf};

pub type AbiResult<T> = Result<T, AbiError>;

#[derive(Debug, thiserror::Error)]
pub enum AbiError {
    #[error("unsupported parameter type '{0}'")]
    UnsupportedType(String),
    #[error("{operation} expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        operation: String,
        expected: usize,
        actual: usize,
    },
    #[error("argument '{param}': {source}")]
    Value {
        param: String,
        #[source]
        source: ValueError,
    },
    #[error("argument '{param}' does not fit in {bits} bits")]
    OutOfRange { param: String, bits: usize },
    #[error("argument '{param}' must be exactly {expected} bytes, got {actual}")]
    FixedBytesLength {
        param: String,
        expected: usize,
        actual: usize,
    },
    #[error("payload truncated: need {needed} bytes at offset {offset}, have {len}")]
    Truncated {
        offset: usize,
        needed: usize,
        len: usize,
    },
    #[error("word at offset {offset} is not a valid {kind}")]
    InvalidWord { offset: usize, kind: &'static str },
    #[error("artifact '{artifact}' has no operation '{operation}'")]
    UnknownOperation { artifact: String, operation: String },
    #[error("operation '{operation}' is overloaded on '{artifact}'; use one of {candidates:?}")]
    AmbiguousOperation {
        artifact: String,
        operation: String,
        candidates: Vec<String>,
    },
    #[error("artifact JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid hex in {field}: {source}")]
    Hex {
        field: &'static str,
        #[source]
        source: hex::FromHexError,
    },
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
