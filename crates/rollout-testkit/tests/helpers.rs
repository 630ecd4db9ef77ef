//! Shared setup for the integration tests.
//!
//! Each test file compiles this module separately, so some helpers look
//! unused from any single file.

#![allow(dead_code)]

use std::sync::Arc;

use rollout_engine::{BatchConfig, DeployConfig, LedgerStore, MemLedger, Services};
use rollout_ledger::{BatchRecord, ResourceRecord};
use rollout_testkit::fixtures::{self, FACTORY, NETWORK, SAFE};
use rollout_testkit::{MockApprovals, MockChain, MockVerifier, SequentialSalts, VerifierMode};

pub struct Harness {
    pub chain: Arc<MockChain>,
    pub ledger: MemLedger,
    pub approvals: Arc<MockApprovals>,
    pub verifier: Arc<MockVerifier>,
    pub services: Services,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_verifier(VerifierMode::Verify)
    }

    pub fn with_verifier(mode: VerifierMode) -> Self {
        let chain = fixtures::chain();
        let ledger = MemLedger::new();
        let approvals = Arc::new(MockApprovals::new(Arc::clone(&chain), SAFE));
        let verifier = Arc::new(MockVerifier::new(mode));
        let services = Services::new(chain.clone(), Arc::new(ledger.clone()))
            .with_approvals(approvals.clone())
            .with_verifier(verifier.clone())
            .with_salts(Arc::new(SequentialSalts::new()));
        Self {
            chain,
            ledger,
            approvals,
            verifier,
            services,
        }
    }

    pub fn record(&self, name: &str) -> Option<ResourceRecord> {
        self.ledger.resource(NETWORK, name).unwrap()
    }

    pub fn batch(&self, name: &str) -> Option<BatchRecord> {
        self.ledger.batch(NETWORK, name).unwrap()
    }
}

pub fn config() -> DeployConfig {
    DeployConfig {
        network: NETWORK.into(),
        ..DeployConfig::default()
    }
}

pub fn batch_config() -> DeployConfig {
    DeployConfig {
        batch: Some(BatchConfig {
            factory: FACTORY,
            safe: SAFE,
            implicit: None,
        }),
        ..config()
    }
}

pub fn implicit_batch_config(name: &str) -> DeployConfig {
    DeployConfig {
        batch: Some(BatchConfig {
            factory: FACTORY,
            safe: SAFE,
            implicit: Some(name.into()),
        }),
        ..config()
    }
}
