use rollout_ledger::BatchRecord;

use super::{Executor, Flow};
use crate::batch::BatchAggregator;
use crate::client::ProposalStatus;
use crate::deploy::BatchHalt;
use crate::error::{ConfigError, RolloutError, UsageError};

impl Executor<'_> {
    /// Starts gathering for `name`, loading whatever state earlier runs persisted.
    pub(super) fn open_batch(&mut self, name: &str) -> Result<(), RolloutError> {
        let config = self
            .config
            .batch
            .as_ref()
            .ok_or_else(|| ConfigError::BatchNotConfigured(name.to_owned()))?;
        let persisted = self.services.ledger.batch(&self.config.network, name)?;
        match &persisted {
            Some(record) => log::info!(
                "batch '{name}' is {:?} as proposal {}",
                record.state,
                record.id
            ),
            None => log::info!("batch '{name}' opened"),
        }
        self.batch = Some(BatchAggregator::new(name, config.factory, persisted));
        Ok(())
    }

    /// Advances the batch's cross-run state. Anything short of executed halts the run.
    pub(super) async fn close_batch(&mut self, name: &str) -> Result<Flow, RolloutError> {
        let batch = match self.batch.take() {
            Some(batch) if batch.name() == name => batch,
            _ => return Err(UsageError::BatchNotOpen(name.to_owned()).into()),
        };

        if batch.is_executed() {
            log::debug!("batch '{name}' already executed");
            return Ok(Flow::Continue);
        }
        match batch.persisted() {
            None if batch.pending().is_empty() => {
                log::info!("batch '{name}' has nothing to propose");
                Ok(Flow::Continue)
            }
            None if self.config.dry_run => {
                log::info!(
                    "dry run: batch '{name}' would propose {} operations",
                    batch.pending().len()
                );
                Ok(halt(name, None, false))
            }
            None => self.propose(&batch).await,
            Some(record) => self.poll(name, record).await,
        }
    }

    async fn propose(&self, batch: &BatchAggregator) -> Result<Flow, RolloutError> {
        let name = batch.name();
        let approvals = self
            .services
            .approvals
            .as_ref()
            .ok_or(ConfigError::ApprovalsMissing)?;
        let id = approvals
            .propose(batch.pending(), self.signer)
            .await
            .map_err(|source| RolloutError::Approval {
                batch: name.to_owned(),
                source,
            })?;
        self.services.ledger.put_batch(
            &self.config.network,
            name,
            &BatchRecord::proposed(id.clone()).with_calls(batch.calls().to_vec()),
        )?;
        log::info!(
            "batch '{name}' proposed as {id} with {} operations",
            batch.pending().len()
        );
        Ok(halt(name, Some(id), true))
    }

    async fn poll(&self, name: &str, record: &BatchRecord) -> Result<Flow, RolloutError> {
        let id = record.id.as_str();
        let approvals = self
            .services
            .approvals
            .as_ref()
            .ok_or(ConfigError::ApprovalsMissing)?;
        let status = approvals
            .poll_status(id)
            .await
            .map_err(|source| RolloutError::Approval {
                batch: name.to_owned(),
                source,
            })?;
        match status {
            ProposalStatus::Pending => {
                log::info!("batch '{name}' ({id}) is still awaiting approval");
                Ok(halt(name, Some(id.to_owned()), false))
            }
            ProposalStatus::Committed(tx_hash) => {
                log::info!("batch '{name}' ({id}) executed in {tx_hash}");
                if !self.config.dry_run {
                    self.services.ledger.put_batch(
                        &self.config.network,
                        name,
                        &record.clone().into_executed(),
                    )?;
                }
                Ok(Flow::Continue)
            }
        }
    }
}

fn halt(batch: &str, proposal_id: Option<String>, newly_proposed: bool) -> Flow {
    Flow::Halt(BatchHalt {
        batch: batch.to_owned(),
        proposal_id,
        newly_proposed,
    })
}
