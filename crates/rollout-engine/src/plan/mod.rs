//! Planning pass: user code calls builders on a [`Planner`], which records an ordered
//! action list and hands back deferred values standing in for results that only exist
//! once execution reaches the recording action.

mod batch;
mod conditional;
mod proxy;
mod resource;

pub use batch::BatchBlock;
pub use conditional::Conditional;
pub use proxy::{Initializer, ProxyHook, ProxyOptions};
pub use resource::{CreateOptions, Resource};

use alloy_primitives::Address;
use rollout_ledger::BATCH_SECTION;
use rollout_values::Deferred;

use crate::action::{Action, Note};
use crate::error::{RolloutError, UsageError};

/// Explicit planning context, created fresh for every deploy run.
#[derive(Debug)]
pub struct Planner {
    enabled: bool,
    actions: Vec<Action>,
    batch_names: Vec<String>,
    open_batch: Option<String>,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

impl Planner {
    pub fn new() -> Self {
        Self {
            enabled: true,
            actions: Vec::new(),
            batch_names: Vec::new(),
            open_batch: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.enabled
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Ends the planning pass and hands over the recorded actions.
    ///
    /// Any later builder call on this planner is a usage error.
    pub fn close(&mut self) -> Result<Vec<Action>, RolloutError> {
        self.ensure_enabled()?;
        self.enabled = false;
        if let Some(open) = self.open_batch.take() {
            return Err(UsageError::UnclosedBatch(open).into());
        }
        Ok(std::mem::take(&mut self.actions))
    }

    pub(crate) fn ensure_enabled(&self) -> Result<(), RolloutError> {
        if !self.enabled {
            return Err(UsageError::PlanningInactive.into());
        }
        Ok(())
    }

    pub(crate) fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub(crate) fn open_batch(&self) -> Option<&str> {
        self.open_batch.as_deref()
    }

    /// Records a human-readable line rendered when execution reaches it.
    pub fn annotate(&mut self, notes: impl IntoIterator<Item = Note>) -> Result<(), RolloutError> {
        self.ensure_enabled()?;
        self.push(Action::Annotate(notes.into_iter().collect()));
        Ok(())
    }

    /// Writes a ledger entry for a resource created outside this plan.
    pub fn record_existing(
        &mut self,
        name: impl Into<String>,
        address: impl Into<Deferred<Address>>,
    ) -> Result<(), RolloutError> {
        self.ensure_enabled()?;
        let name = name.into();
        validate_name(&name)?;
        self.push(Action::RecordExisting {
            name,
            address: address.into(),
        });
        Ok(())
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), UsageError> {
    if name.is_empty() {
        return Err(UsageError::EmptyName);
    }
    if name == BATCH_SECTION {
        return Err(UsageError::ReservedName(name.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_planner_rejects_builders() {
        let mut plan = Planner::new();
        plan.annotate([Note::from("hello")]).unwrap();
        let actions = plan.close().unwrap();
        assert_eq!(actions.len(), 1);
        assert!(!plan.is_active());
        let err = plan.annotate([Note::from("late")]).unwrap_err();
        assert!(matches!(err, RolloutError::Usage(UsageError::PlanningInactive)));
    }

    #[test]
    fn reserved_names_are_rejected_at_planning_time() {
        let mut plan = Planner::new();
        let err = plan
            .record_existing(BATCH_SECTION, Address::ZERO)
            .unwrap_err();
        assert!(matches!(err, RolloutError::Usage(UsageError::ReservedName(_))));
        let err = plan.record_existing("", Address::ZERO).unwrap_err();
        assert!(matches!(err, RolloutError::Usage(UsageError::EmptyName)));
    }
}
