//! In-memory chain double.
//!
//! Contracts are instances of registered artifacts. Creation code is matched
//! against the registered kinds by longest bytecode prefix, calls are routed
//! by selector, and each kind's behaviour is a plain closure over the
//! instance's field map. Salted creations go through registered factory
//! addresses using the same address formula the engine predicts with.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
use async_trait::async_trait;
use indexmap::IndexMap;
use rollout_abi::{Artifact, Operation, Param, decode_values, encode_values, unwrap_salted_creation};
use rollout_engine::{ChainClient, ChainError, Fee, Receipt, Transaction};
use rollout_values::Value;

pub const CREATION_GAS: u64 = 3_000_000;
pub const CALL_GAS: u64 = 200_000;
pub const GAS_PRICE_WEI: u64 = 1_000_000_000;

/// Named fields of one contract instance.
pub type ContractState = IndexMap<String, Value>;

/// What a behaviour sees for one constructor run or operation call.
pub struct Invocation<'a> {
    pub sender: Address,
    pub this: Address,
    /// Operation name, or `"constructor"`.
    pub operation: &'a str,
    pub params: &'a [Param],
    pub args: &'a [Value],
}

/// Behaviour of a contract kind. An `Err` reverts the call.
pub type Handler =
    Arc<dyn Fn(&mut ContractState, &Invocation<'_>) -> Result<Value, String> + Send + Sync>;

/// Default behaviour: every argument is stored under its parameter name and
/// an operation returns the field named after it (zero when unset).
pub fn field_store() -> Handler {
    Arc::new(|state, call| {
        for (position, (param, arg)) in call.params.iter().zip(call.args).enumerate() {
            let key = if param.name.is_empty() {
                format!("arg{position}")
            } else {
                param.name.clone()
            };
            state.insert(key, arg.clone());
        }
        Ok(state.get(call.operation).cloned().unwrap_or_default())
    })
}

/// Side-effect counters, for asserting what a run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub estimates: usize,
    pub sends: usize,
    pub calls: usize,
    pub code_reads: usize,
    pub storage_reads: usize,
}

impl CallCounts {
    /// Estimates and sends: everything that would cost fees.
    pub fn transactions(&self) -> usize {
        self.estimates + self.sends
    }
}

struct Kind {
    artifact: Arc<Artifact>,
    handler: Handler,
}

struct Contract {
    kind: usize,
    code: Bytes,
    state: ContractState,
}

#[derive(Default)]
struct ChainState {
    block: u64,
    nonces: HashMap<Address, u64>,
    kinds: Vec<Kind>,
    contracts: HashMap<Address, Contract>,
    factories: Vec<Address>,
    storage: HashMap<(Address, B256), B256>,
    receipts: HashMap<B256, Receipt>,
    reverts: Vec<String>,
    sent: Vec<(Transaction, Fee)>,
    counts: CallCounts,
}

pub struct MockChain {
    signer: Address,
    state: Mutex<ChainState>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChain {
    pub fn new() -> Self {
        Self::with_signer(Address::repeat_byte(0x5e))
    }

    pub fn with_signer(signer: Address) -> Self {
        Self {
            signer,
            state: Mutex::new(ChainState::default()),
        }
    }

    pub fn signer(&self) -> Address {
        self.signer
    }

    fn lock(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, artifact: &Arc<Artifact>) {
        self.register_with(artifact, field_store());
    }

    pub fn register_with(&self, artifact: &Arc<Artifact>, handler: Handler) {
        self.lock().kinds.push(Kind {
            artifact: Arc::clone(artifact),
            handler,
        });
    }

    /// Marks `address` as a salted-creation factory accepting `performCreate2`.
    pub fn add_factory(&self, address: Address) {
        self.lock().factories.push(address);
    }

    /// Every later transaction invoking `operation` (or creating a contract of
    /// kind `operation`) reverts.
    pub fn revert_operation(&self, operation: impl Into<String>) {
        self.lock().reverts.push(operation.into());
    }

    pub fn clear_reverts(&self) {
        self.lock().reverts.clear();
    }

    pub fn counts(&self) -> CallCounts {
        self.lock().counts
    }

    pub fn reset_counts(&self) {
        self.lock().counts = CallCounts::default();
    }

    /// Every transaction sent through the client, with the fee it carried.
    pub fn sent(&self) -> Vec<(Transaction, Fee)> {
        self.lock().sent.clone()
    }

    pub fn block_number(&self) -> u64 {
        self.lock().block
    }

    pub fn kind_at(&self, address: Address) -> Option<String> {
        let state = self.lock();
        let contract = state.contracts.get(&address)?;
        Some(state.kinds[contract.kind].artifact.name().to_owned())
    }

    pub fn code_at(&self, address: Address) -> Option<Bytes> {
        self.lock()
            .contracts
            .get(&address)
            .map(|contract| contract.code.clone())
    }

    pub fn field(&self, address: Address, name: &str) -> Option<Value> {
        self.lock()
            .contracts
            .get(&address)
            .and_then(|contract| contract.state.get(name).cloned())
    }

    /// Overwrites the runtime code at `address`, e.g. to simulate a recompile.
    pub fn replace_code(&self, address: Address, code: impl Into<Bytes>) {
        if let Some(contract) = self.lock().contracts.get_mut(&address) {
            contract.code = code.into();
        }
    }

    pub fn set_storage(&self, address: Address, slot: B256, word: B256) {
        self.lock().storage.insert((address, slot), word);
    }

    /// Applies `tx` as if `sender` had sent it, outside fee accounting.
    pub fn execute_as(&self, sender: Address, tx: &Transaction) -> Result<Receipt, ChainError> {
        self.lock().execute(sender, tx)
    }
}

impl ChainState {
    fn execute(&mut self, sender: Address, tx: &Transaction) -> Result<Receipt, ChainError> {
        let nonce = self.nonces.entry(sender).or_default();
        let used = *nonce;
        *nonce += 1;

        let mut preimage = sender.to_vec();
        preimage.extend_from_slice(&used.to_be_bytes());
        preimage.extend_from_slice(&tx.data);
        let tx_hash = keccak256(&preimage);

        let created_address = match tx.to {
            None => {
                let address = sender.create(used);
                self.instantiate(address, sender, &tx.data)?;
                Some(address)
            }
            Some(factory) if self.factories.contains(&factory) => {
                let (init_code, salt, _value) = unwrap_salted_creation(&tx.data).ok_or_else(|| {
                    ChainError::Reverted("factory only accepts performCreate2".into())
                })?;
                let address = factory.create2_from_code(salt, &init_code);
                self.instantiate(address, factory, &init_code)?;
                None
            }
            Some(to) => {
                self.invoke(sender, to, &tx.data, true)?;
                None
            }
        };

        self.block += 1;
        let receipt = Receipt {
            tx_hash,
            block_number: self.block,
            created_address,
        };
        self.receipts.insert(tx_hash, receipt.clone());
        Ok(receipt)
    }

    fn instantiate(&mut self, address: Address, sender: Address, payload: &[u8]) -> Result<(), ChainError> {
        let (index, kind) = self
            .kinds
            .iter()
            .enumerate()
            .filter(|(_, kind)| {
                let code = kind.artifact.bytecode();
                !code.is_empty() && payload.starts_with(code)
            })
            .max_by_key(|(_, kind)| kind.artifact.bytecode().len())
            .ok_or_else(|| ChainError::Reverted("unknown creation code".into()))?;
        let artifact = Arc::clone(&kind.artifact);
        let handler = Arc::clone(&kind.handler);

        if self.reverts.iter().any(|name| name == artifact.name()) {
            return Err(ChainError::Reverted(format!("{} constructor", artifact.name())));
        }
        if self.contracts.contains_key(&address) {
            return Err(ChainError::Reverted(format!("{address} is already in use")));
        }
        let args = decode_values(artifact.constructor(), &payload[artifact.bytecode().len()..])
            .map_err(|err| ChainError::Reverted(err.to_string()))?;

        let mut state = ContractState::new();
        handler(
            &mut state,
            &Invocation {
                sender,
                this: address,
                operation: "constructor",
                params: artifact.constructor(),
                args: &args,
            },
        )
        .map_err(ChainError::Reverted)?;

        self.contracts.insert(
            address,
            Contract {
                kind: index,
                code: artifact.deployed_bytecode().clone(),
                state,
            },
        );
        Ok(())
    }

    /// Routes `data` to the operation it selects. Calls a proxy does not know
    /// are forwarded to its `implementation` field, run against the proxy's state.
    fn resolve(&self, contract: &Contract, selector: &[u8]) -> Option<(Operation, Handler)> {
        let lookup = |kind: &Kind| {
            kind.artifact
                .operations()
                .find(|operation| operation.selector().as_slice() == selector)
                .map(|operation| (operation.clone(), Arc::clone(&kind.handler)))
        };
        if let Some(found) = lookup(&self.kinds[contract.kind]) {
            return Some(found);
        }
        let Some(Value::Address(target)) = contract.state.get("implementation") else {
            return None;
        };
        let implementation = self.contracts.get(target)?;
        lookup(&self.kinds[implementation.kind])
    }

    fn invoke(&mut self, sender: Address, to: Address, data: &[u8], commit: bool) -> Result<Bytes, ChainError> {
        let Some(contract) = self.contracts.get(&to) else {
            return Ok(Bytes::new());
        };
        let selector = data
            .get(..4)
            .ok_or_else(|| ChainError::Reverted("call data has no selector".into()))?;
        let (operation, handler) = self
            .resolve(contract, selector)
            .ok_or_else(|| ChainError::Reverted(format!("no operation for selector 0x{}", hex::encode(selector))))?;
        if commit && self.reverts.contains(&operation.name) {
            return Err(ChainError::Reverted(operation.name.clone()));
        }
        let args = decode_values(&operation.inputs, &data[4..])
            .map_err(|err| ChainError::Reverted(err.to_string()))?;

        let mut scratch = contract.state.clone();
        let result = handler(
            &mut scratch,
            &Invocation {
                sender,
                this: to,
                operation: &operation.name,
                params: &operation.inputs,
                args: &args,
            },
        )
        .map_err(ChainError::Reverted)?;
        if commit {
            if let Some(contract) = self.contracts.get_mut(&to) {
                contract.state = scratch;
            }
        }
        encode_result(&operation, result)
    }
}

fn encode_result(operation: &Operation, result: Value) -> Result<Bytes, ChainError> {
    let outputs = &operation.outputs;
    if outputs.is_empty() {
        return Ok(Bytes::new());
    }
    if result == Value::Unit {
        return Ok(Bytes::from(vec![0u8; 32 * outputs.len()]));
    }
    let values = match (outputs.len(), result) {
        (1, value) => vec![value],
        (_, Value::Record(fields)) => fields.into_values().collect(),
        (_, Value::List(items)) => items,
        (_, value) => vec![value],
    };
    encode_values(outputs, &values)
        .map(Bytes::from)
        .map_err(|err| ChainError::Reverted(err.to_string()))
}

#[async_trait]
impl ChainClient for MockChain {
    async fn signer_address(&self) -> Result<Address, ChainError> {
        Ok(self.signer)
    }

    async fn estimate_fee(&self, tx: &Transaction) -> Result<Fee, ChainError> {
        self.lock().counts.estimates += 1;
        Ok(Fee {
            gas_limit: if tx.to.is_none() { CREATION_GAS } else { CALL_GAS },
            gas_price: U256::from(GAS_PRICE_WEI),
        })
    }

    async fn send(&self, tx: &Transaction, fee: &Fee) -> Result<B256, ChainError> {
        let mut state = self.lock();
        state.counts.sends += 1;
        state.sent.push((tx.clone(), *fee));
        state.execute(self.signer, tx).map(|receipt| receipt.tx_hash)
    }

    async fn wait(&self, tx_hash: B256) -> Result<Receipt, ChainError> {
        self.lock()
            .receipts
            .get(&tx_hash)
            .cloned()
            .ok_or(ChainError::MissingReceipt(tx_hash))
    }

    async fn call(&self, to: Address, data: &Bytes) -> Result<Bytes, ChainError> {
        let mut state = self.lock();
        state.counts.calls += 1;
        state.invoke(self.signer, to, data, false)
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, ChainError> {
        let mut state = self.lock();
        state.counts.code_reads += 1;
        Ok(state
            .contracts
            .get(&address)
            .map(|contract| contract.code.clone())
            .unwrap_or_default())
    }

    async fn get_storage_at(&self, address: Address, slot: B256) -> Result<B256, ChainError> {
        let mut state = self.lock();
        state.counts.storage_reads += 1;
        Ok(state.storage.get(&(address, slot)).copied().unwrap_or_default())
    }
}
