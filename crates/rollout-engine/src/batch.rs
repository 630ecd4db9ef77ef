//! Gathering side of the batch state machine: operations queued between a
//! batch's brackets, with creations rewritten into salted factory calls so
//! their addresses are known at queue time.

use alloy_primitives::{Address, B256, Bytes, Selector, U256};
use rollout_abi::{salted_address, wrap_salted_creation};
use rollout_ledger::{BatchCall, BatchRecord, BatchState};

use crate::client::Transaction;

/// Operations gathered for one batch during an execution pass.
#[derive(Debug)]
pub struct BatchAggregator {
    name: String,
    factory: Address,
    /// Cross-run state loaded when the batch opened. `None` means never proposed.
    persisted: Option<BatchRecord>,
    /// Proposed calls not yet matched by this pass.
    unclaimed: Vec<BatchCall>,
    pending: Vec<Transaction>,
    calls: Vec<BatchCall>,
}

impl BatchAggregator {
    pub fn new(name: impl Into<String>, factory: Address, persisted: Option<BatchRecord>) -> Self {
        let unclaimed = persisted
            .as_ref()
            .map(|record| record.calls.clone())
            .unwrap_or_default();
        Self {
            name: name.into(),
            factory,
            persisted,
            unclaimed,
            pending: Vec::new(),
            calls: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn persisted(&self) -> Option<&BatchRecord> {
        self.persisted.as_ref()
    }

    /// True once an earlier run proposed this batch; its operations are then
    /// already in flight and must not be queued again.
    pub fn is_settled(&self) -> bool {
        self.persisted.is_some()
    }

    pub fn is_executed(&self) -> bool {
        matches!(
            self.persisted,
            Some(BatchRecord {
                state: BatchState::Executed,
                ..
            })
        )
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    /// Calls queued this pass, as they will be persisted with the proposal.
    pub fn calls(&self) -> &[BatchCall] {
        &self.calls
    }

    /// Queues a creation through the factory and returns the address it will land at.
    /// `value` goes to the created contract; the factory call itself carries none.
    pub fn queue_creation(&mut self, payload: &Bytes, salt: B256, value: U256) -> Address {
        let address = salted_address(self.factory, salt, payload);
        self.pending.push(Transaction {
            to: Some(self.factory),
            data: wrap_salted_creation(payload, salt, value),
            value: U256::ZERO,
        });
        address
    }

    pub fn queue_call(&mut self, to: Address, data: Bytes, value: U256) {
        self.calls.push(batch_call(to, &data));
        self.pending.push(Transaction {
            to: Some(to),
            data,
            value,
        });
    }

    /// Matches a call against the persisted proposal, consuming the match.
    /// False when the proposal never contained it.
    pub fn claim_call(&mut self, to: Address, data: &[u8]) -> bool {
        let call = batch_call(to, data);
        match self.unclaimed.iter().position(|proposed| *proposed == call) {
            Some(index) => {
                self.unclaimed.remove(index);
                true
            }
            None => false,
        }
    }
}

fn batch_call(to: Address, data: &[u8]) -> BatchCall {
    let selector = data
        .get(..4)
        .map(Selector::from_slice)
        .unwrap_or_default();
    BatchCall { to, selector }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollout_abi::unwrap_salted_creation;

    #[test]
    fn queued_creation_targets_factory_and_predicts_address() {
        let factory = Address::repeat_byte(0x0f);
        let mut batch = BatchAggregator::new("setup", factory, None);
        let payload = Bytes::from_static(&[0x60, 0x00, 0x60, 0x00]);
        let salt = B256::repeat_byte(0x42);

        let predicted = batch.queue_creation(&payload, salt, U256::ZERO);
        assert_eq!(predicted, factory.create2_from_code(salt, &payload));

        let queued = &batch.pending()[0];
        assert_eq!(queued.to, Some(factory));
        assert_eq!(
            unwrap_salted_creation(&queued.data),
            Some((payload, salt, U256::ZERO))
        );
        assert!(batch.calls().is_empty());
    }

    #[test]
    fn creation_value_is_forwarded_by_the_factory() {
        let mut batch = BatchAggregator::new("setup", Address::repeat_byte(0x0f), None);
        let payload = Bytes::from_static(&[0x60, 0x00]);
        batch.queue_creation(&payload, B256::ZERO, U256::from(3));

        let queued = &batch.pending()[0];
        assert_eq!(queued.value, U256::ZERO);
        let (_, _, value) = unwrap_salted_creation(&queued.data).unwrap();
        assert_eq!(value, U256::from(3));
    }

    #[test]
    fn settled_batch_claims_each_proposed_call_once() {
        let target = Address::repeat_byte(0x0c);
        let data = [0x55, 0x24, 0x10, 0x77, 0x00];
        let mut first = BatchAggregator::new("setup", Address::ZERO, None);
        first.queue_call(target, Bytes::copy_from_slice(&data), U256::ZERO);

        let record = BatchRecord::proposed("7").with_calls(first.calls().to_vec());
        let mut rerun = BatchAggregator::new("setup", Address::ZERO, Some(record));
        assert!(rerun.claim_call(target, &data));
        assert!(!rerun.claim_call(target, &data));
        assert!(!rerun.claim_call(Address::repeat_byte(0x0d), &data));
    }

    #[test]
    fn persisted_state_marks_batch_settled() {
        let fresh = BatchAggregator::new("a", Address::ZERO, None);
        assert!(!fresh.is_settled());

        let proposed = BatchAggregator::new("a", Address::ZERO, Some(BatchRecord::proposed("7")));
        assert!(proposed.is_settled());
        assert!(!proposed.is_executed());

        let executed = BatchAggregator::new("a", Address::ZERO, Some(BatchRecord::executed("7")));
        assert!(executed.is_executed());
    }
}
