mod commands;
mod opts;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::ledger::ForgetArgs;
use opts::LedgerOpts;

#[derive(Parser, Debug)]
#[command(name = "rollout", version, about = "Deployment ledger tooling")]
struct Cli {
    #[command(flatten)]
    opts: LedgerOpts,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inspect or edit the deployment ledger
    #[command(subcommand)]
    Ledger(LedgerCommand),
}

#[derive(Subcommand, Debug)]
enum LedgerCommand {
    /// List recorded resources
    List,

    /// List batch proposals and their state
    Batches,

    /// Drop a resource so the next run creates it again
    Forget(ForgetArgs),
}

fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();
    let opts = &cli.opts;

    match cli.command {
        Command::Ledger(cmd) => match cmd {
            LedgerCommand::List => commands::ledger::cmd_list(opts),
            LedgerCommand::Batches => commands::ledger::cmd_batches(opts),
            LedgerCommand::Forget(args) => commands::ledger::cmd_forget(opts, &args),
        },
    }
}

/// Logs go to stderr, filtered by `RUST_LOG` (default `warn`).
fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
