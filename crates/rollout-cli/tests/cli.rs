use std::process::Command;

use alloy_primitives::{Address, B256};
use assert_cmd::prelude::*;
use predicates::prelude::*;
use rollout_ledger::{BatchRecord, FsLedger, LedgerStore, ResourceRecord};
use tempfile::TempDir;

fn rollout() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("rollout"));
    cmd.env_remove("ROLLOUT_LEDGER").env_remove("ROLLOUT_NETWORK");
    cmd
}

fn seeded(dir: &TempDir) -> FsLedger {
    let ledger = FsLedger::new(dir.path().join("deployments.json"));
    ledger
        .put_resource(
            "mainnet",
            "token",
            &ResourceRecord {
                address: Address::repeat_byte(0x11),
                creation_tx_hash: Some(B256::repeat_byte(0x22)),
                is_batched: false,
            },
        )
        .unwrap();
    ledger
        .put_resource(
            "mainnet",
            "registry",
            &ResourceRecord {
                address: Address::repeat_byte(0x33),
                creation_tx_hash: None,
                is_batched: true,
            },
        )
        .unwrap();
    ledger
        .put_batch("mainnet", "setup", &BatchRecord::proposed("proposal-1"))
        .unwrap();
    ledger
}

#[test]
fn help_lists_ledger_commands() {
    rollout()
        .args(["ledger", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("batches"))
        .stdout(predicate::str::contains("forget"));
}

#[test]
fn list_prints_one_row_per_resource() {
    let dir = TempDir::new().expect("tmpdir");
    let ledger = seeded(&dir);
    rollout()
        .arg("--ledger")
        .arg(ledger.path())
        .args(["--network", "mainnet", "ledger", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("token\t"))
        .stdout(predicate::str::contains("registry\t"))
        .stdout(predicate::str::contains("batched"))
        .stdout(predicate::str::contains("_multisig").not());
}

#[test]
fn list_json_wraps_records() {
    let dir = TempDir::new().expect("tmpdir");
    let ledger = seeded(&dir);
    let assert = rollout()
        .env("ROLLOUT_LEDGER", ledger.path())
        .env("ROLLOUT_NETWORK", "mainnet")
        .args(["ledger", "list", "--json"])
        .assert()
        .success();

    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).expect("json");
    assert_eq!(json["data"]["registry"]["isBatched"], serde_json::json!(true));
    assert_eq!(
        json["data"]["token"]["address"],
        serde_json::json!(Address::repeat_byte(0x11))
    );
}

#[test]
fn batches_show_state_and_id() {
    let dir = TempDir::new().expect("tmpdir");
    let ledger = seeded(&dir);
    rollout()
        .arg("--ledger")
        .arg(ledger.path())
        .args(["--network", "mainnet", "ledger", "batches"])
        .assert()
        .success()
        .stdout(predicate::str::contains("setup\tPROPOSED\tproposal-1"));
}

#[test]
fn forget_removes_the_record() {
    let dir = TempDir::new().expect("tmpdir");
    let ledger = seeded(&dir);
    rollout()
        .arg("--ledger")
        .arg(ledger.path())
        .args(["--network", "mainnet", "ledger", "forget", "token"])
        .assert()
        .success()
        .stdout(predicate::str::contains("forgot token on mainnet"));

    assert!(ledger.resource("mainnet", "token").unwrap().is_none());
    assert!(ledger.resource("mainnet", "registry").unwrap().is_some());
    assert!(ledger.batch("mainnet", "setup").unwrap().is_some());
}

#[test]
fn forgetting_an_unknown_resource_fails() {
    let dir = TempDir::new().expect("tmpdir");
    let ledger = seeded(&dir);
    rollout()
        .arg("--ledger")
        .arg(ledger.path())
        .args(["--network", "mainnet", "ledger", "forget", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no resource 'missing'"));
}

#[test]
fn missing_ledger_lists_nothing() {
    let dir = TempDir::new().expect("tmpdir");
    rollout()
        .arg("--ledger")
        .arg(dir.path().join("absent.json"))
        .args(["ledger", "list"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
