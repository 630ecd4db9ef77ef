use rollout_values::Deferred;

use super::Planner;
use crate::action::Action;
use crate::error::RolloutError;

/// Chain returned by [`Planner::run_if`] for `else_if` / `otherwise` arms.
///
/// Every arm is recorded; each later arm's condition is the conjunction of
/// "no earlier arm ran" and its own condition, so at most one arm executes.
#[derive(Debug, Clone)]
pub struct Conditional {
    earlier_taken: Deferred<bool>,
}

impl Planner {
    /// Records `block` between conditional brackets. `condition` is resolved
    /// once, when execution reaches the opening bracket.
    pub fn run_if(
        &mut self,
        condition: impl Into<Deferred<bool>>,
        block: impl FnOnce(&mut Planner) -> Result<(), RolloutError>,
    ) -> Result<Conditional, RolloutError> {
        self.ensure_enabled()?;
        let condition = condition.into();
        self.push(Action::ConditionalStart(condition.clone()));
        block(self)?;
        self.ensure_enabled()?;
        self.push(Action::ConditionalEnd);
        Ok(Conditional {
            earlier_taken: condition,
        })
    }
}

impl Conditional {
    pub fn else_if(
        self,
        plan: &mut Planner,
        condition: impl Into<Deferred<bool>>,
        block: impl FnOnce(&mut Planner) -> Result<(), RolloutError>,
    ) -> Result<Conditional, RolloutError> {
        let condition = condition.into();
        plan.run_if(self.earlier_taken.not().and(condition.clone()), block)?;
        Ok(Conditional {
            earlier_taken: self.earlier_taken.or(condition),
        })
    }

    pub fn otherwise(
        self,
        plan: &mut Planner,
        block: impl FnOnce(&mut Planner) -> Result<(), RolloutError>,
    ) -> Result<(), RolloutError> {
        plan.run_if(self.earlier_taken.not(), block)?;
        Ok(())
    }
}
