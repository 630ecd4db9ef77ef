mod helpers;

use std::sync::Arc;

use alloy_primitives::Address;
use helpers::{Harness, config};
use rollout_engine::{
    Artifact, CreateOptions, DeployConfig, FsLedger, LedgerStore, Services, deploy,
};
use rollout_testkit::fixtures::{self, NETWORK};
use tempfile::TempDir;

async fn create_token(
    harness: &Harness,
    artifact: Arc<Artifact>,
    options: CreateOptions,
) -> Address {
    let deployment = deploy(config(), &harness.services, |plan, _, _| {
        Ok(plan.create_with(&artifact, options)?.address())
    })
    .await
    .unwrap();
    assert!(deployment.is_complete());
    deployment.result.resolve().unwrap()
}

#[tokio::test]
async fn token_scenario_ledgers_once_and_reuses() {
    let harness = Harness::new();
    let address = create_token(&harness, fixtures::token(), CreateOptions::default()).await;

    let counts = harness.chain.counts();
    assert_eq!(counts.sends, 1);
    let record = harness.record("token").unwrap();
    assert_eq!(record.address, address);
    assert!(!record.is_batched);

    let doc = serde_json::to_value(harness.ledger.snapshot()).unwrap();
    let entry = &doc[NETWORK]["token"];
    assert_eq!(entry["address"], serde_json::json!(address));
    assert_eq!(entry["creationTxHash"], serde_json::json!(record.creation_tx_hash.unwrap()));
    assert_eq!(entry["isBatched"], serde_json::json!(false));

    harness.chain.reset_counts();
    let again = create_token(&harness, fixtures::token(), CreateOptions::default()).await;
    assert_eq!(again, address);
    assert_eq!(harness.chain.counts().transactions(), 0);
}

#[tokio::test]
async fn metadata_only_recompile_is_not_redeployed() {
    let harness = Harness::new();
    let address = create_token(&harness, fixtures::token(), CreateOptions::default()).await;
    harness.chain.reset_counts();

    let again = create_token(&harness, fixtures::token_recompiled(), CreateOptions::default()).await;
    assert_eq!(again, address);
    assert_eq!(harness.chain.counts().sends, 0);
}

#[tokio::test]
async fn changed_code_is_created_again() {
    let harness = Harness::new();
    let first = create_token(&harness, fixtures::token(), CreateOptions::default()).await;
    let second = create_token(&harness, fixtures::token_v2(), CreateOptions::default()).await;

    assert_ne!(first, second);
    assert_eq!(harness.record("token").unwrap().address, second);
    assert_eq!(harness.chain.code_at(second).unwrap(), *fixtures::token_v2().deployed_bytecode());
}

#[tokio::test]
async fn skip_upgrade_keeps_the_recorded_address() {
    let harness = Harness::new();
    let first = create_token(&harness, fixtures::token(), CreateOptions::default()).await;
    harness.chain.reset_counts();

    let kept = create_token(
        &harness,
        fixtures::token_v2(),
        CreateOptions::default().skip_upgrade(),
    )
    .await;
    assert_eq!(kept, first);
    assert_eq!(harness.chain.counts().transactions(), 0);
    assert_eq!(harness.chain.counts().code_reads, 0);
}

#[tokio::test]
async fn missing_code_at_recorded_address_recreates() {
    let harness = Harness::new();
    let first = create_token(&harness, fixtures::token(), CreateOptions::default()).await;
    harness.chain.replace_code(first, alloy_primitives::Bytes::new());

    let second = create_token(&harness, fixtures::token(), CreateOptions::default()).await;
    assert_ne!(first, second);
}

#[tokio::test]
async fn file_ledger_survives_between_runs() {
    let dir = TempDir::new().unwrap();
    let config = DeployConfig {
        network: NETWORK.into(),
        ledger_path: dir.path().join("deployments.json"),
        ..DeployConfig::default()
    };
    let chain = fixtures::chain();
    let token = fixtures::token();

    let services = Services::for_config(chain.clone(), &config);
    let first = deploy(config.clone(), &services, |plan, _, _| {
        Ok(plan.create(&token)?.address())
    })
    .await
    .unwrap()
    .result
    .resolve()
    .unwrap();

    let raw = std::fs::read_to_string(&config.ledger_path).unwrap();
    assert!(raw.ends_with("}\n"));
    assert!(raw.contains("\n    \"token\": {"));

    chain.reset_counts();
    let reopened = Services::for_config(chain.clone(), &config);
    let second = deploy(config.clone(), &reopened, |plan, _, _| {
        Ok(plan.create(&token)?.address())
    })
    .await
    .unwrap()
    .result
    .resolve()
    .unwrap();
    assert_eq!(first, second);
    assert_eq!(chain.counts().transactions(), 0);

    let ledger = FsLedger::new(&config.ledger_path);
    assert_eq!(ledger.resource(NETWORK, "token").unwrap().unwrap().address, first);
}

#[tokio::test]
async fn dry_run_sends_but_never_records() {
    let harness = Harness::new();
    let config = DeployConfig {
        dry_run: true,
        ..config()
    };
    let token = fixtures::token();
    let deployment = deploy(config, &harness.services, |plan, _, _| {
        Ok(plan.create(&token)?.address())
    })
    .await
    .unwrap();

    assert!(deployment.is_complete());
    assert_eq!(harness.chain.counts().sends, 1);
    assert!(harness.record("token").is_none());
    assert!(harness.ledger.snapshot().is_empty());
}
