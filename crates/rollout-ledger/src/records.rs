use alloy_primitives::{Address, B256, Selector};
use serde::{Deserialize, Serialize};

/// Where a logical resource lives on one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_tx_hash: Option<B256>,
    /// Created through an approval batch; the address was precomputed.
    #[serde(default)]
    pub is_batched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchState {
    Proposed,
    Executed,
}

/// A non-creation operation included in a proposal, keyed by target and selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCall {
    pub to: Address,
    pub selector: Selector,
}

/// Persisted state of one named batch. Absence means it was never proposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub id: String,
    pub state: BatchState,
    /// Calls submitted with the proposal, in order. Creations are tracked by
    /// their batched resource records instead.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<BatchCall>,
}

impl BatchRecord {
    pub fn proposed(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: BatchState::Proposed,
            calls: Vec::new(),
        }
    }

    pub fn executed(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: BatchState::Executed,
            calls: Vec::new(),
        }
    }

    pub fn with_calls(mut self, calls: Vec<BatchCall>) -> Self {
        self.calls = calls;
        self
    }

    /// Same proposal, now committed.
    pub fn into_executed(self) -> Self {
        Self {
            state: BatchState::Executed,
            ..self
        }
    }
}
