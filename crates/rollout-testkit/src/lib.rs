//! Test doubles for the rollout engine: an in-memory chain, an approval
//! service, a verifier and reproducible salts, plus artifact fixtures.

pub mod approvals;
pub mod chain;
pub mod fixtures;
pub mod verifier;

pub use approvals::{MockApprovals, Proposal};
pub use chain::{CallCounts, ContractState, Handler, Invocation, MockChain, field_store};
pub use verifier::{MockVerifier, SequentialSalts, VerifierMode};
