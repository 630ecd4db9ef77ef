//! Global CLI options.

use std::path::PathBuf;

use clap::Args;
use rollout_engine::{DEFAULT_LEDGER, DEFAULT_NETWORK};
use rollout_ledger::FsLedger;

/// Options shared by every command; each can also come from the environment.
#[derive(Args, Debug, Clone)]
pub struct LedgerOpts {
    /// Ledger file (env: ROLLOUT_LEDGER)
    #[arg(long, global = true, env = "ROLLOUT_LEDGER", default_value = DEFAULT_LEDGER)]
    pub ledger: PathBuf,

    /// Network section to operate on (env: ROLLOUT_NETWORK)
    #[arg(long, global = true, env = "ROLLOUT_NETWORK", default_value = DEFAULT_NETWORK)]
    pub network: String,

    /// JSON output envelope
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output (implies --json)
    #[arg(long, global = true)]
    pub pretty: bool,
}

impl LedgerOpts {
    pub fn open(&self) -> FsLedger {
        FsLedger::new(&self.ledger)
    }
}
