mod helpers;

use alloy_primitives::{Address, B256, Bytes, U256};
use helpers::{Harness, config};
use rollout_engine::{Arg, CreateOptions, DeployConfig, Note, TxOverrides, deploy};
use rollout_ledger::TxJournal;
use rollout_testkit::VerifierMode;
use rollout_testkit::chain::{CALL_GAS, CREATION_GAS};
use rollout_testkit::fixtures::{self, NETWORK};
use rollout_values::Value;
use tempfile::TempDir;

#[tokio::test]
async fn annotations_render_resources_and_values() {
    let harness = Harness::new();
    let deployment = deploy(config(), &harness.services, |plan, _, _| {
        let token = plan.create(&fixtures::token())?;
        let supply = plan.call(&token, "totalSupply", [])?;
        plan.annotate([Note::from("deployed"), Note::from(&token)])?;
        plan.annotate([Note::from("supply"), Note::from(supply)])?;
        Ok(token.address())
    })
    .await
    .unwrap();

    let address = deployment.result.resolve().unwrap();
    assert_eq!(
        deployment.annotations,
        vec![format!("deployed Token#{address}"), "supply 0".to_owned()]
    );
}

#[tokio::test]
async fn existing_resources_are_recorded_without_a_transaction() {
    let harness = Harness::new();
    let external = Address::repeat_byte(0x77);
    deploy(config(), &harness.services, |plan, _, _| {
        plan.record_existing("oracle", external)
    })
    .await
    .unwrap();

    let record = harness.record("oracle").unwrap();
    assert_eq!(record.address, external);
    assert_eq!(record.creation_tx_hash, None);
    assert!(!record.is_batched);
    assert_eq!(harness.chain.counts().transactions(), 0);
}

#[tokio::test]
async fn encode_produces_call_data_without_sending() {
    let harness = Harness::new();
    let counter = fixtures::counter();
    let deployment = deploy(config(), &harness.services, |plan, _, _| {
        plan.encode(&counter, "setValue", [Arg::from(9u64)])
    })
    .await
    .unwrap();

    let expected = counter
        .operation("setValue")
        .unwrap()
        .encode_call(&[Value::from(9u64)])
        .unwrap();
    assert_eq!(deployment.result.resolve().unwrap(), expected);
    assert_eq!(harness.chain.counts().sends, 0);
}

#[tokio::test]
async fn storage_words_are_read_raw() {
    let harness = Harness::new();
    let slot = B256::with_last_byte(3);
    let word = B256::repeat_byte(0xab);
    let target = Address::repeat_byte(0x42);
    harness.chain.set_storage(target, slot, word);

    let deployment = deploy(config(), &harness.services, |plan, _, _| {
        plan.read_storage(target, slot)
    })
    .await
    .unwrap();
    assert_eq!(
        deployment.result.resolve().unwrap(),
        Bytes::copy_from_slice(word.as_slice())
    );
    assert_eq!(harness.chain.counts().storage_reads, 1);
}

#[tokio::test]
async fn verification_is_requested_when_enabled() {
    let harness = Harness::new();
    let config = DeployConfig {
        verify: true,
        ..config()
    };
    let deployment = deploy(config, &harness.services, |plan, _, _| {
        let counter = plan.create_with(
            &fixtures::counter(),
            CreateOptions::default().args([Arg::from(4u64)]),
        )?;
        Ok(counter.address())
    })
    .await
    .unwrap();

    let requests = harness.verifier.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].kind, "Counter");
    assert_eq!(requests[0].network, NETWORK);
    assert_eq!(requests[0].address, deployment.result.resolve().unwrap());
    assert_eq!(
        requests[0].constructor_args,
        Bytes::from(U256::from(4).to_be_bytes::<32>().to_vec())
    );
}

#[tokio::test]
async fn verification_failures_do_not_abort_the_run() {
    let harness = Harness::with_verifier(VerifierMode::Fail);
    let config = DeployConfig {
        verify: true,
        ..config()
    };
    let deployment = deploy(config, &harness.services, |plan, _, _| {
        plan.create(&fixtures::token())?;
        plan.create_with(
            &fixtures::counter(),
            CreateOptions::default().args([Arg::from(1u64)]),
        )?;
        Ok(())
    })
    .await
    .unwrap();

    assert!(deployment.is_complete());
    assert_eq!(harness.verifier.requests().len(), 2);
    assert!(harness.record("counter").is_some());
}

#[tokio::test]
async fn verification_is_off_by_default() {
    let harness = Harness::new();
    deploy(config(), &harness.services, |plan, _, _| {
        plan.create(&fixtures::token())?;
        Ok(())
    })
    .await
    .unwrap();
    assert!(harness.verifier.requests().is_empty());
}

#[tokio::test]
async fn journal_records_fees_after_overrides() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("tx.jsonl");
    let harness = Harness::new();
    let config = DeployConfig {
        gas_price: Some(U256::from(5)),
        tx_log: Some(log_path.clone()),
        ..config()
    };
    let deployment = deploy(config, &harness.services, |plan, _, _| {
        let token = plan.create(&fixtures::token())?;
        plan.call_with(
            &token,
            "mint",
            [Arg::from(10u64)],
            TxOverrides {
                gas_limit: Some(50_000),
                gas_price: Some(U256::from(7)),
                value: Some(U256::from(3)),
            },
        )?;
        Ok(token.address())
    })
    .await
    .unwrap();
    let token = deployment.result.resolve().unwrap();

    let records = TxJournal::new(&log_path).read_all().unwrap();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].label, "create token");
    assert_eq!(records[0].network, NETWORK);
    assert_eq!(records[0].created_address, Some(token));
    assert_eq!(records[0].gas_limit, CREATION_GAS);
    assert_eq!(records[0].gas_price, U256::from(5));
    assert_eq!(
        Some(records[0].tx_hash),
        harness.record("token").unwrap().creation_tx_hash
    );

    assert_eq!(records[1].label, "token.mint");
    assert_eq!(records[1].created_address, None);
    assert_eq!(records[1].gas_limit, 50_000);
    assert_eq!(records[1].gas_price, U256::from(7));
    assert!(records[1].block_number > records[0].block_number);

    let sent = harness.chain.sent();
    assert_eq!(sent[1].0.value, U256::from(3));
    assert_eq!(sent[1].0.to, Some(token));
    assert_eq!(harness.chain.field(token, "totalSupply"), Some(Value::from(10u64)));
}

#[tokio::test]
async fn estimates_are_used_without_overrides() {
    let harness = Harness::new();
    deploy(config(), &harness.services, |plan, _, _| {
        let counter = plan.create_with(
            &fixtures::counter(),
            CreateOptions::default().args([Arg::from(1u64)]),
        )?;
        plan.call(&counter, "increment", [])?;
        Ok(())
    })
    .await
    .unwrap();

    let sent = harness.chain.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].1.gas_limit, CREATION_GAS);
    assert_eq!(sent[1].1.gas_limit, CALL_GAS);
    assert_eq!(sent[1].0.value, U256::ZERO);
}
