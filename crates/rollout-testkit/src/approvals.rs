use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy_primitives::{Address, B256, Bytes};
use async_trait::async_trait;
use indexmap::IndexMap;
use rollout_engine::{ApprovalError, ApprovalService, ChainError, ProposalStatus, Transaction};

use crate::chain::MockChain;

#[derive(Debug, Clone)]
pub struct Proposal {
    pub transactions: Vec<Transaction>,
    pub proposer: Address,
    pub signatures: Vec<Bytes>,
    pub committed: Option<B256>,
}

/// Approval service that holds proposals until [`MockApprovals::commit`]
/// replays them on the chain as the approving account.
pub struct MockApprovals {
    chain: Arc<MockChain>,
    safe: Address,
    proposals: Mutex<IndexMap<String, Proposal>>,
}

impl MockApprovals {
    pub fn new(chain: Arc<MockChain>, safe: Address) -> Self {
        Self {
            chain,
            safe,
            proposals: Mutex::new(IndexMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<String, Proposal>> {
        self.proposals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn proposal_count(&self) -> usize {
        self.lock().len()
    }

    pub fn proposal(&self, id: &str) -> Option<Proposal> {
        self.lock().get(id).cloned()
    }

    /// Executes every queued transaction of `id`, in order, as the safe.
    pub fn commit(&self, id: &str) -> Result<B256, ChainError> {
        let transactions = self
            .proposal(id)
            .ok_or_else(|| ChainError::Rpc(format!("unknown proposal {id}")))?
            .transactions;
        let mut last = B256::ZERO;
        for tx in &transactions {
            last = self.chain.execute_as(self.safe, tx)?.tx_hash;
        }
        if let Some(proposal) = self.lock().get_mut(id) {
            proposal.committed = Some(last);
        }
        Ok(last)
    }
}

#[async_trait]
impl ApprovalService for MockApprovals {
    async fn propose(
        &self,
        txs: &[Transaction],
        proposer: Address,
    ) -> Result<String, ApprovalError> {
        let mut proposals = self.lock();
        let id = format!("proposal-{}", proposals.len() + 1);
        proposals.insert(
            id.clone(),
            Proposal {
                transactions: txs.to_vec(),
                proposer,
                signatures: Vec::new(),
                committed: None,
            },
        );
        Ok(id)
    }

    async fn poll_status(&self, id: &str) -> Result<ProposalStatus, ApprovalError> {
        let proposals = self.lock();
        let proposal = proposals
            .get(id)
            .ok_or_else(|| ApprovalError::UnknownProposal(id.to_owned()))?;
        Ok(match proposal.committed {
            Some(tx_hash) => ProposalStatus::Committed(tx_hash),
            None => ProposalStatus::Pending,
        })
    }

    async fn approve(&self, id: &str, signature: &Bytes) -> Result<(), ApprovalError> {
        self.lock()
            .get_mut(id)
            .ok_or_else(|| ApprovalError::UnknownProposal(id.to_owned()))?
            .signatures
            .push(signature.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, SAFE};
    use alloy_primitives::U256;

    #[tokio::test]
    async fn proposals_stay_pending_until_committed() {
        let chain = fixtures::chain();
        let approvals = MockApprovals::new(Arc::clone(&chain), SAFE);
        let counter = fixtures::counter();
        let tx = Transaction {
            to: None,
            data: counter
                .creation_payload(&[rollout_values::Value::from(1u64)])
                .unwrap(),
            value: U256::ZERO,
        };
        let id = approvals.propose(&[tx], chain.signer()).await.unwrap();
        assert_eq!(approvals.poll_status(&id).await.unwrap(), ProposalStatus::Pending);

        approvals.approve(&id, &Bytes::from_static(b"sig")).await.unwrap();
        let hash = approvals.commit(&id).unwrap();
        assert_eq!(
            approvals.poll_status(&id).await.unwrap(),
            ProposalStatus::Committed(hash)
        );
        assert_eq!(chain.kind_at(SAFE.create(0)).as_deref(), Some("Counter"));
        assert_eq!(approvals.proposal(&id).unwrap().signatures.len(), 1);
    }

    #[tokio::test]
    async fn unknown_proposals_are_rejected() {
        let approvals = MockApprovals::new(fixtures::chain(), SAFE);
        let err = approvals.poll_status("nope").await.unwrap_err();
        assert!(matches!(err, ApprovalError::UnknownProposal(_)));
    }
}
