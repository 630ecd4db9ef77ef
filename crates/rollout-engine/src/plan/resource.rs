use std::sync::Arc;

use alloy_primitives::{Address, B256, Bytes};
use rollout_abi::{Artifact, Mutability};
use rollout_values::{Arg, Deferred, Value};

use super::{Planner, validate_name};
use crate::action::{Action, CallAction, CreateAction, EncodeAction, StorageAction, TxOverrides};
use crate::error::RolloutError;

/// Handle to a created (or recorded) resource: its logical name, its kind's
/// interface table and its eventual address.
#[derive(Debug, Clone)]
pub struct Resource {
    name: String,
    artifact: Arc<Artifact>,
    address: Deferred<Address>,
}

impl Resource {
    /// Views an address through an interface, e.g. an implementation behind a proxy.
    pub fn at(
        name: impl Into<String>,
        artifact: Arc<Artifact>,
        address: impl Into<Deferred<Address>>,
    ) -> Self {
        Self {
            name: name.into(),
            artifact,
            address: address.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn artifact(&self) -> &Arc<Artifact> {
        &self.artifact
    }

    pub fn address(&self) -> Deferred<Address> {
        self.address.clone()
    }
}

impl From<&Resource> for Deferred<Address> {
    fn from(resource: &Resource) -> Self {
        resource.address()
    }
}

impl From<&Resource> for Arg {
    fn from(resource: &Resource) -> Self {
        Arg::from(resource.address())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Logical ledger name; defaults to the kind with a lower-cased first letter.
    pub name: Option<String>,
    pub args: Vec<Arg>,
    pub skip_upgrade: bool,
    pub overrides: TxOverrides,
}

impl CreateOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn args(mut self, args: impl IntoIterator<Item = Arg>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    pub fn skip_upgrade(mut self) -> Self {
        self.skip_upgrade = true;
        self
    }

    pub fn overrides(mut self, overrides: TxOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

impl Planner {
    /// Creates (or reuses) a resource of `artifact`'s kind under its default name.
    pub fn create(&mut self, artifact: &Arc<Artifact>) -> Result<Resource, RolloutError> {
        self.create_with(artifact, CreateOptions::default())
    }

    pub fn create_with(
        &mut self,
        artifact: &Arc<Artifact>,
        options: CreateOptions,
    ) -> Result<Resource, RolloutError> {
        self.ensure_enabled()?;
        let name = options
            .name
            .unwrap_or_else(|| artifact.default_resource_name());
        validate_name(&name)?;
        check_arity(
            &format!("{} constructor", artifact.name()),
            artifact.constructor().len(),
            options.args.len(),
        )?;

        let (address, slot) = Deferred::slot(format!("{name}.address"));
        self.push(Action::Create(CreateAction {
            artifact: Arc::clone(artifact),
            name: name.clone(),
            args: options.args,
            skip_upgrade: options.skip_upgrade,
            overrides: options.overrides,
            batch: self.open_batch().map(str::to_owned),
            address: slot,
        }));
        Ok(Resource {
            name,
            artifact: Arc::clone(artifact),
            address,
        })
    }

    /// Invokes `operation` on `resource`. View/pure operations record a read,
    /// everything else a mutation.
    pub fn call(
        &mut self,
        resource: &Resource,
        operation: &str,
        args: impl IntoIterator<Item = Arg>,
    ) -> Result<Deferred<Value>, RolloutError> {
        self.call_with(resource, operation, args, TxOverrides::default())
    }

    pub fn call_with(
        &mut self,
        resource: &Resource,
        operation: &str,
        args: impl IntoIterator<Item = Arg>,
        overrides: TxOverrides,
    ) -> Result<Deferred<Value>, RolloutError> {
        self.ensure_enabled()?;
        let operation = resource.artifact.operation(operation)?.clone();
        let args: Vec<Arg> = args.into_iter().collect();
        check_arity(&operation.signature(), operation.inputs.len(), args.len())?;

        let (result, slot) = Deferred::slot(format!("{}.{}", resource.name, operation.name));
        let call = CallAction {
            resource: resource.name.clone(),
            target: resource.address(),
            args,
            overrides,
            batch: self.open_batch().map(str::to_owned),
            result: slot,
            operation,
        };
        self.push(match call.operation.mutability {
            Mutability::Read => Action::Read(call),
            Mutability::Mutate => Action::Mutate(call),
        });
        Ok(result)
    }

    /// Builds call data for `operation` without sending anything.
    pub fn encode(
        &mut self,
        artifact: &Artifact,
        operation: &str,
        args: impl IntoIterator<Item = Arg>,
    ) -> Result<Deferred<Bytes>, RolloutError> {
        self.ensure_enabled()?;
        let operation = artifact.operation(operation)?.clone();
        let args: Vec<Arg> = args.into_iter().collect();
        check_arity(&operation.signature(), operation.inputs.len(), args.len())?;

        let (result, slot) = Deferred::slot(format!("encode {}", operation.name));
        self.push(Action::Encode(EncodeAction {
            operation,
            args,
            result: slot,
        }));
        Ok(result)
    }

    /// Reads one raw 32-byte storage word.
    pub fn read_storage(
        &mut self,
        target: impl Into<Deferred<Address>>,
        key: B256,
    ) -> Result<Deferred<Bytes>, RolloutError> {
        self.ensure_enabled()?;
        let (result, slot) = Deferred::slot(format!("storage {key}"));
        self.push(Action::ReadStorage(StorageAction {
            target: target.into(),
            key,
            result: slot,
        }));
        Ok(result)
    }
}

fn check_arity(operation: &str, expected: usize, actual: usize) -> Result<(), RolloutError> {
    if expected != actual {
        return Err(rollout_abi::AbiError::ArgumentCount {
            operation: operation.to_owned(),
            expected,
            actual,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UsageError;
    use rollout_abi::{Operation, Param, ParamType};

    fn counter() -> Arc<Artifact> {
        Arc::new(
            Artifact::builder("Counter")
                .constructor(vec![Param::new("start", ParamType::Uint(256))])
                .operation(Operation::new(
                    "value",
                    vec![],
                    vec![Param::new("", ParamType::Uint(256))],
                    Mutability::Read,
                ))
                .operation(Operation::new(
                    "set",
                    vec![Param::new("next", ParamType::Uint(256))],
                    vec![],
                    Mutability::Mutate,
                ))
                .build(),
        )
    }

    #[test]
    fn create_uses_lower_camel_default_name() {
        let mut plan = Planner::new();
        let resource = plan
            .create_with(&counter(), CreateOptions::default().args([Arg::from(1u64)]))
            .unwrap();
        assert_eq!(resource.name(), "counter");
        assert!(matches!(&plan.actions()[0], Action::Create(create) if create.name == "counter"));
    }

    #[test]
    fn operations_dispatch_by_mutability() {
        let mut plan = Planner::new();
        let counter = plan
            .create_with(
                &counter(),
                CreateOptions::named("c1").args([Arg::from(1u64)]),
            )
            .unwrap();
        plan.call(&counter, "value", []).unwrap();
        plan.call(&counter, "set", [Arg::from(2u64)]).unwrap();
        let kinds: Vec<&str> = plan.actions().iter().map(Action::kind).collect();
        assert_eq!(kinds, vec!["create", "read", "mutate"]);
    }

    #[test]
    fn results_are_unbound_until_executed() {
        let mut plan = Planner::new();
        let counter = plan
            .create_with(&counter(), CreateOptions::default().args([Arg::from(1u64)]))
            .unwrap();
        let value = plan.call(&counter, "value", []).unwrap();
        assert!(matches!(
            value.number().resolve(),
            Err(rollout_values::DeferredError::Unbound(label)) if label == "counter.value"
        ));
    }

    #[test]
    fn unknown_operations_and_bad_arity_are_usage_errors() {
        let mut plan = Planner::new();
        let err = plan.create(&counter()).unwrap_err();
        assert!(matches!(err, RolloutError::Usage(UsageError::Interface(_))));

        let counter = plan
            .create_with(&counter(), CreateOptions::default().args([Arg::from(1u64)]))
            .unwrap();
        assert!(plan.call(&counter, "missing", []).unwrap_err().is_usage());
        assert!(plan.call(&counter, "set", []).unwrap_err().is_usage());
    }

    #[test]
    fn encode_and_storage_reads_record_actions() {
        let mut plan = Planner::new();
        let artifact = counter();
        plan.encode(&artifact, "set", [Arg::from(5u64)]).unwrap();
        plan.read_storage(Address::ZERO, B256::ZERO).unwrap();
        let kinds: Vec<&str> = plan.actions().iter().map(Action::kind).collect();
        assert_eq!(kinds, vec!["encode", "read-storage"]);
    }
}
