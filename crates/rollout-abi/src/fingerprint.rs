use alloy_primitives::{B256, keccak256};
use once_cell::sync::Lazy;
use regex::Regex;

// Compiler metadata trailers: `bzzr1` swarm hash and `ipfs` CID, both CBOR-framed.
static BZZR1_TRAILER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"65627a7a72305820[a-f\d]{64}").expect("static regex"));
static IPFS_TRAILER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"64697066735822[a-f\d]{68}").expect("static regex"));

/// Hash of runtime code with compiler metadata zeroed out, so that rebuilds
/// which only change the embedded source hash compare equal.
pub fn code_fingerprint(code: &[u8]) -> B256 {
    let hex = hex::encode(code);
    let without_bzzr = BZZR1_TRAILER.replace_all(&hex, "0".repeat(80).as_str());
    let normalized = IPFS_TRAILER.replace_all(&without_bzzr, "0".repeat(82).as_str());
    keccak256(normalized.as_bytes())
}

pub fn same_code(left: &[u8], right: &[u8]) -> bool {
    code_fingerprint(left) == code_fingerprint(right)
}
