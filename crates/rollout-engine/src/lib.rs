//! Declarative rollout engine.
//!
//! A deploy run has two passes. The planning pass runs user code against a
//! [`Planner`], which only records [`Action`]s and hands back [`Deferred`]
//! stand-ins for results. The execution pass then walks those actions in
//! order against the chain, consulting the ledger so that re-running the same
//! plan only performs what has not happened yet.

pub mod action;
pub mod client;
pub mod config;
pub mod error;
pub mod plan;

mod batch;
mod deploy;
mod execute;
mod verify;

pub use action::{Action, Note, TxOverrides, next_depth};
pub use client::{
    ApprovalError, ApprovalService, ChainClient, ChainError, Fee, ProposalStatus, RandomSalt,
    Receipt, SaltSource, Transaction, VerificationRequest, Verifier, VerifyError, VerifyOutcome,
};
pub use config::{BatchConfig, DEFAULT_LEDGER, DEFAULT_NETWORK, DeployConfig};
pub use deploy::{BatchHalt, Deployment, RunStatus, Services, deploy};
pub use error::{ConfigError, RolloutError, UsageError};
pub use plan::{
    BatchBlock, Conditional, CreateOptions, Initializer, Planner, ProxyHook, ProxyOptions, Resource,
};

pub use rollout_abi::{Artifact, Mutability, Operation, Param, ParamType};
pub use rollout_ledger::{DynLedger, FsLedger, LedgerStore, MemLedger};
pub use rollout_values::{Arg, Deferred, Value};
