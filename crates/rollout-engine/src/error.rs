use rollout_abi::AbiError;
use rollout_ledger::LedgerError;
use rollout_values::DeferredError;
use thiserror::Error;

use crate::client::{ApprovalError, ChainError};

/// Bugs in the plan itself. Raised at planning time where possible and never retried.
#[derive(Debug, Error)]
pub enum UsageError {
    #[error("builders can only be used inside an active deploy() planning pass")]
    PlanningInactive,
    #[error("batch '{open}' is still open; propose it before opening '{requested}'")]
    BatchAlreadyOpen { open: String, requested: String },
    #[error("batch name '{0}' is used more than once in this plan")]
    DuplicateBatch(String),
    #[error("batch '{0}' is not the open batch")]
    BatchNotOpen(String),
    #[error("batch '{0}' was opened but never proposed")]
    UnclosedBatch(String),
    #[error("batch '{batch}' was already proposed without {action}; propose it under a new batch")]
    SettledBatchChanged { batch: String, action: String },
    #[error("resource name '{0}' is reserved")]
    ReservedName(String),
    #[error("resource name must not be empty")]
    EmptyName,
    #[error(transparent)]
    Interface(#[from] AbiError),
    #[error("condition could not be resolved when execution reached it: {0}")]
    UnresolvedCondition(#[source] DeferredError),
    #[error(transparent)]
    Deferred(#[from] DeferredError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}='{value}' is not a valid {expected}")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("batch configuration is incomplete: {missing} is not set")]
    PartialBatch { missing: &'static str },
    #[error("implicit batch '{implicit}' cannot be combined with explicit batch '{explicit}'")]
    ImplicitWithExplicit { implicit: String, explicit: String },
    #[error("plan opens batch '{0}' but no batch factory/safe is configured")]
    BatchNotConfigured(String),
    #[error("batching is configured but no approval service was supplied")]
    ApprovalsMissing,
}

#[derive(Debug, Error)]
pub enum RolloutError {
    #[error("usage error: {0}")]
    Usage(#[from] UsageError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("{action} failed: {source}")]
    Chain {
        action: String,
        #[source]
        source: ChainError,
    },
    #[error("batch '{batch}': {source}")]
    Approval {
        batch: String,
        #[source]
        source: ApprovalError,
    },
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("{action}: {source}")]
    Codec {
        action: String,
        #[source]
        source: AbiError,
    },
    #[error("salt generation failed: {0}")]
    Salt(#[source] anyhow::Error),
}

impl From<DeferredError> for RolloutError {
    fn from(err: DeferredError) -> Self {
        RolloutError::Usage(UsageError::Deferred(err))
    }
}

impl From<AbiError> for RolloutError {
    fn from(err: AbiError) -> Self {
        RolloutError::Usage(UsageError::Interface(err))
    }
}

impl RolloutError {
    pub fn is_usage(&self) -> bool {
        matches!(self, RolloutError::Usage(_))
    }

    pub(crate) fn chain(action: impl Into<String>, source: ChainError) -> Self {
        RolloutError::Chain {
            action: action.into(),
            source,
        }
    }

    pub(crate) fn codec(action: impl Into<String>, source: AbiError) -> Self {
        RolloutError::Codec {
            action: action.into(),
            source,
        }
    }
}
