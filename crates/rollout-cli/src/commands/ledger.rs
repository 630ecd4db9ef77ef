//! `rollout ledger` commands: inspect and edit one network's section.

use anyhow::{Context, Result, bail};
use clap::Args;
use rollout_ledger::LedgerStore;
use serde_json::json;

use crate::opts::LedgerOpts;
use crate::output::print_success;

#[derive(Args, Debug)]
pub struct ForgetArgs {
    /// Logical resource name to drop from the ledger
    pub name: String,
}

pub fn cmd_list(opts: &LedgerOpts) -> Result<()> {
    let ledger = opts.open();
    let resources = ledger
        .resources(&opts.network)
        .with_context(|| format!("read resources from {}", opts.ledger.display()))?;
    tracing::debug!(count = resources.len(), network = %opts.network, "listing resources");

    let rows = resources
        .iter()
        .map(|(name, record)| {
            let origin = match (record.is_batched, record.creation_tx_hash) {
                (true, _) => "batched".to_owned(),
                (false, Some(hash)) => hash.to_string(),
                (false, None) => "recorded".to_owned(),
            };
            format!("{name}\t{}\t{origin}", record.address)
        })
        .collect();
    print_success(opts, serde_json::to_value(&resources)?, rows)
}

pub fn cmd_batches(opts: &LedgerOpts) -> Result<()> {
    let ledger = opts.open();
    let batches = ledger
        .batches(&opts.network)
        .with_context(|| format!("read batches from {}", opts.ledger.display()))?;

    let rows = batches
        .iter()
        .map(|(name, record)| {
            let state = serde_json::to_value(record.state)
                .ok()
                .and_then(|value| value.as_str().map(str::to_owned))
                .unwrap_or_default();
            format!("{name}\t{state}\t{}", record.id)
        })
        .collect();
    print_success(opts, serde_json::to_value(&batches)?, rows)
}

pub fn cmd_forget(opts: &LedgerOpts, args: &ForgetArgs) -> Result<()> {
    let ledger = opts.open();
    let removed = ledger
        .remove_resource(&opts.network, &args.name)
        .with_context(|| format!("update {}", opts.ledger.display()))?;
    if !removed {
        bail!(
            "no resource '{}' on network '{}' in {}",
            args.name,
            opts.network,
            opts.ledger.display()
        );
    }
    tracing::info!(name = %args.name, network = %opts.network, "resource forgotten");
    print_success(
        opts,
        json!({ "forgotten": args.name, "network": opts.network }),
        vec![format!("forgot {} on {}", args.name, opts.network)],
    )
}
