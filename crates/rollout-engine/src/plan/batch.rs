use super::Planner;
use crate::action::Action;
use crate::error::{RolloutError, UsageError};

/// An open batch bracket. Creations and mutations recorded until
/// [`BatchBlock::propose`] are submitted together for approval.
#[derive(Debug)]
#[must_use = "an opened batch must be closed with `propose`"]
pub struct BatchBlock {
    name: String,
}

impl BatchBlock {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn propose(self, plan: &mut Planner) -> Result<(), RolloutError> {
        plan.ensure_enabled()?;
        if plan.open_batch.as_deref() != Some(self.name.as_str()) {
            return Err(UsageError::BatchNotOpen(self.name).into());
        }
        plan.open_batch = None;
        plan.push(Action::BatchEnd(self.name));
        Ok(())
    }
}

impl Planner {
    /// Opens batch `name`. Names are unique per plan and batches do not nest.
    pub fn batch(&mut self, name: impl Into<String>) -> Result<BatchBlock, RolloutError> {
        self.ensure_enabled()?;
        let name = name.into();
        if let Some(open) = &self.open_batch {
            return Err(UsageError::BatchAlreadyOpen {
                open: open.clone(),
                requested: name,
            }
            .into());
        }
        if self.batch_names.contains(&name) {
            return Err(UsageError::DuplicateBatch(name).into());
        }
        self.batch_names.push(name.clone());
        self.open_batch = Some(name.clone());
        self.push(Action::BatchStart(name.clone()));
        Ok(BatchBlock { name })
    }
}
