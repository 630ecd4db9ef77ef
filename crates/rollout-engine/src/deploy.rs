use std::sync::Arc;

use alloy_primitives::Address;
use rollout_ledger::{DynLedger, FsLedger};

use crate::action::Action;
use crate::client::{ApprovalService, ChainClient, RandomSalt, SaltSource, Verifier};
use crate::config::DeployConfig;
use crate::error::{ConfigError, RolloutError};
use crate::execute::Executor;
use crate::plan::Planner;

/// External collaborators a deploy run drives.
#[derive(Clone)]
pub struct Services {
    pub chain: Arc<dyn ChainClient>,
    pub ledger: DynLedger,
    pub approvals: Option<Arc<dyn ApprovalService>>,
    pub verifier: Option<Arc<dyn Verifier>>,
    pub salts: Arc<dyn SaltSource>,
}

impl Services {
    pub fn new(chain: Arc<dyn ChainClient>, ledger: DynLedger) -> Self {
        Self {
            chain,
            ledger,
            approvals: None,
            verifier: None,
            salts: Arc::new(RandomSalt),
        }
    }

    /// Uses the ledger file named by `config.ledger_path`.
    pub fn for_config(chain: Arc<dyn ChainClient>, config: &DeployConfig) -> Self {
        Self::new(chain, Arc::new(FsLedger::new(&config.ledger_path)))
    }

    pub fn with_approvals(mut self, approvals: Arc<dyn ApprovalService>) -> Self {
        self.approvals = Some(approvals);
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn Verifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn with_salts(mut self, salts: Arc<dyn SaltSource>) -> Self {
        self.salts = salts;
        self
    }
}

/// Why a run stopped before its last action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchHalt {
    pub batch: String,
    /// `None` only for dry runs, which never submit proposals.
    pub proposal_id: Option<String>,
    /// The proposal was submitted during this run rather than polled.
    pub newly_proposed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// Waiting on batch approval. Not a failure: re-run the same plan later.
    Halted(BatchHalt),
}

#[derive(Debug)]
pub struct Deployment<T> {
    pub result: T,
    pub config: DeployConfig,
    pub status: RunStatus,
    /// Rendered annotation lines, in execution order.
    pub annotations: Vec<String>,
}

impl<T> Deployment<T> {
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn halt(&self) -> Option<&BatchHalt> {
        match &self.status {
            RunStatus::Halted(halt) => Some(halt),
            RunStatus::Completed => None,
        }
    }
}

/// Plans with `plan`, then executes the recorded actions against `services`.
///
/// The plan function only records; every side effect happens afterwards, in
/// recording order. A batch still awaiting approval ends the run early with
/// [`RunStatus::Halted`].
pub async fn deploy<T, F>(
    config: DeployConfig,
    services: &Services,
    plan: F,
) -> Result<Deployment<T>, RolloutError>
where
    F: FnOnce(&mut Planner, Address, &DeployConfig) -> Result<T, RolloutError>,
{
    let signer = services
        .chain
        .signer_address()
        .await
        .map_err(|err| RolloutError::chain("signer lookup", err))?;

    let mut planner = Planner::new();
    let result = plan(&mut planner, signer, &config)?;
    let actions = planner.close()?;
    log::debug!("planned {} actions for network '{}'", actions.len(), config.network);

    check_batch_setup(&config, services, &actions)?;

    let mut executor = Executor::new(&config, services, signer);
    let status = executor.run(&actions).await?;
    let annotations = executor.into_annotations();
    if let RunStatus::Halted(halt) = &status {
        log::info!(
            "run halted at batch '{}' awaiting approval ({})",
            halt.batch,
            halt.proposal_id.as_deref().unwrap_or("not proposed")
        );
    }

    Ok(Deployment {
        result,
        config,
        status,
        annotations,
    })
}

/// Rejects batch setups that could only fail part-way through a run.
fn check_batch_setup(
    config: &DeployConfig,
    services: &Services,
    actions: &[Action],
) -> Result<(), ConfigError> {
    let explicit = actions.iter().find_map(|action| match action {
        Action::BatchStart(name) => Some(name),
        _ => None,
    });
    if let Some(explicit) = explicit {
        match &config.batch {
            None => return Err(ConfigError::BatchNotConfigured(explicit.clone())),
            Some(batch) => {
                if let Some(implicit) = &batch.implicit {
                    return Err(ConfigError::ImplicitWithExplicit {
                        implicit: implicit.clone(),
                        explicit: explicit.clone(),
                    });
                }
            }
        }
    }
    let batching = explicit.is_some() || config.implicit_batch().is_some();
    if batching && services.approvals.is_none() {
        return Err(ConfigError::ApprovalsMissing);
    }
    Ok(())
}
