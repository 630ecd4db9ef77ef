use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use alloy_primitives::{B256, U256};
use async_trait::async_trait;
use rollout_engine::{SaltSource, VerificationRequest, Verifier, VerifyError, VerifyOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifierMode {
    Verify,
    AlreadyVerified,
    Fail,
}

/// Records every request and answers according to its mode.
#[derive(Debug)]
pub struct MockVerifier {
    mode: VerifierMode,
    requests: Mutex<Vec<VerificationRequest>>,
}

impl MockVerifier {
    pub fn new(mode: VerifierMode) -> Self {
        Self {
            mode,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<VerificationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Verifier for MockVerifier {
    async fn verify(&self, request: &VerificationRequest) -> Result<VerifyOutcome, VerifyError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        match self.mode {
            VerifierMode::Verify => Ok(VerifyOutcome::Verified),
            VerifierMode::AlreadyVerified => Ok(VerifyOutcome::AlreadyVerified),
            VerifierMode::Fail => Err(VerifyError::Service("explorer unavailable".into())),
        }
    }
}

/// Salts 1, 2, 3, ... so batch addresses are reproducible in tests.
#[derive(Debug)]
pub struct SequentialSalts {
    next: AtomicU64,
}

impl SequentialSalts {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialSalts {
    fn default() -> Self {
        Self::new()
    }
}

impl SaltSource for SequentialSalts {
    fn next_salt(&self) -> anyhow::Result<B256> {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        Ok(B256::from(U256::from(n).to_be_bytes::<32>()))
    }
}
