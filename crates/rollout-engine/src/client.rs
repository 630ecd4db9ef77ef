//! Collaborators the engine drives: the chain client, the approval (multisig) service,
//! the source verifier and the salt source for deterministic batch addresses.

use alloy_primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;
use thiserror::Error;

/// An operation to broadcast. `to: None` creates a resource from `data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub to: Option<Address>,
    pub data: Bytes,
    pub value: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fee {
    pub gas_limit: u64,
    pub gas_price: U256,
}

impl Fee {
    /// Upper bound on what the transaction can cost, in wei.
    pub fn total(&self) -> U256 {
        self.gas_price.saturating_mul(U256::from(self.gas_limit))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: B256,
    pub block_number: u64,
    pub created_address: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalStatus {
    Pending,
    Committed(B256),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub kind: String,
    pub address: Address,
    pub constructor_args: Bytes,
    pub network: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    AlreadyVerified,
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("execution reverted: {0}")]
    Reverted(String),
    #[error("no receipt for transaction {0}")]
    MissingReceipt(B256),
    #[error("creation {0} did not report a created address")]
    MissingCreatedAddress(B256),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("approval service error: {0}")]
    Service(String),
    #[error("unknown proposal '{0}'")]
    UnknownProposal(String),
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("verification service error: {0}")]
    Service(String),
    #[error("verification rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn signer_address(&self) -> Result<Address, ChainError>;
    async fn estimate_fee(&self, tx: &Transaction) -> Result<Fee, ChainError>;
    async fn send(&self, tx: &Transaction, fee: &Fee) -> Result<B256, ChainError>;
    async fn wait(&self, tx_hash: B256) -> Result<Receipt, ChainError>;
    async fn call(&self, to: Address, data: &Bytes) -> Result<Bytes, ChainError>;
    async fn get_code(&self, address: Address) -> Result<Bytes, ChainError>;
    async fn get_storage_at(&self, address: Address, slot: B256) -> Result<B256, ChainError>;
}

#[async_trait]
pub trait ApprovalService: Send + Sync {
    /// Submits the batch for approval and returns its proposal id.
    async fn propose(&self, txs: &[Transaction], proposer: Address) -> Result<String, ApprovalError>;
    async fn poll_status(&self, id: &str) -> Result<ProposalStatus, ApprovalError>;
    async fn approve(&self, id: &str, signature: &Bytes) -> Result<(), ApprovalError>;
}

#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, request: &VerificationRequest) -> Result<VerifyOutcome, VerifyError>;
}

/// Draws the 32-byte salts used for deterministic batch addresses.
pub trait SaltSource: Send + Sync {
    fn next_salt(&self) -> anyhow::Result<B256>;
}

/// Salts from the operating system's random source.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSalt;

impl SaltSource for RandomSalt {
    fn next_salt(&self) -> anyhow::Result<B256> {
        let mut salt = [0u8; 32];
        getrandom::getrandom(&mut salt)
            .map_err(|err| anyhow::anyhow!("random source unavailable: {err}"))?;
        Ok(B256::from(salt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_salts_differ() {
        let first = RandomSalt.next_salt().unwrap();
        let second = RandomSalt.next_salt().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn fee_total_saturates() {
        let fee = Fee {
            gas_limit: u64::MAX,
            gas_price: U256::MAX,
        };
        assert_eq!(fee.total(), U256::MAX);
        let fee = Fee {
            gas_limit: 21_000,
            gas_price: U256::from(2),
        };
        assert_eq!(fee.total(), U256::from(42_000));
    }
}
