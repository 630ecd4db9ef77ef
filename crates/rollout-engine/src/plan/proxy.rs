use std::fmt;
use std::sync::Arc;

use alloy_primitives::Address;
use rollout_abi::Artifact;
use rollout_values::Arg;

use super::{CreateOptions, Planner, Resource};
use crate::error::RolloutError;

/// A plan step run against a proxy-related resource.
#[derive(Clone)]
pub struct ProxyHook(Arc<dyn Fn(&mut Planner, &Resource) -> Result<(), RolloutError> + Send + Sync>);

impl ProxyHook {
    pub fn new(
        hook: impl Fn(&mut Planner, &Resource) -> Result<(), RolloutError> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(hook))
    }

    fn run(&self, plan: &mut Planner, resource: &Resource) -> Result<(), RolloutError> {
        (self.0)(plan, resource)
    }
}

impl fmt::Debug for ProxyHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProxyHook")
    }
}

/// How the proxy is set up behind its first target.
#[derive(Debug, Clone)]
pub enum Initializer {
    /// Call one operation of the implementation's interface with these arguments.
    Operation(String, Vec<Arg>),
    /// Record arbitrary steps against the resource behind the proxy.
    With(ProxyHook),
}

/// Options for [`Planner::proxy`].
#[derive(Debug, Clone)]
pub struct ProxyOptions {
    /// Ledger name of the forwarding resource; defaults to `{implementation}_proxy`.
    pub name: Option<String>,
    /// Constructor arguments of the forwarding resource.
    pub args: Vec<Arg>,
    /// Operation on the forwarding resource that retargets it.
    pub upgrade_operation: String,
    /// Replaces the retarget call; receives the forwarding resource.
    pub on_upgrade: Option<ProxyHook>,
    /// One-time initializer run through the proxy on first retarget.
    pub initialize: Option<Initializer>,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self {
            name: None,
            args: Vec::new(),
            upgrade_operation: "upgradeTo".into(),
            on_upgrade: None,
            initialize: None,
        }
    }
}

impl ProxyOptions {
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

    pub fn upgrade_operation(mut self, operation: impl Into<String>) -> Self {
        self.upgrade_operation = operation.into();
        self
    }

    pub fn upgrade_with(
        mut self,
        hook: impl Fn(&mut Planner, &Resource) -> Result<(), RolloutError> + Send + Sync + 'static,
    ) -> Self {
        self.on_upgrade = Some(ProxyHook::new(hook));
        self
    }

    pub fn initialize(
        mut self,
        operation: impl Into<String>,
        args: impl IntoIterator<Item = Arg>,
    ) -> Self {
        self.initialize = Some(Initializer::Operation(
            operation.into(),
            args.into_iter().collect(),
        ));
        self
    }

    pub fn initialize_with(
        mut self,
        hook: impl Fn(&mut Planner, &Resource) -> Result<(), RolloutError> + Send + Sync + 'static,
    ) -> Self {
        self.initialize = Some(Initializer::With(ProxyHook::new(hook)));
        self
    }
}

impl Planner {
    /// Deploys (or reuses) a forwarding resource and points it at `implementation`.
    ///
    /// Returns a handle speaking the implementation's interface at the
    /// forwarding resource's address. The retarget call is only live when the
    /// current target differs; the initializer only when the target was unset.
    pub fn proxy(
        &mut self,
        proxy_artifact: &Arc<Artifact>,
        implementation: &Resource,
        options: ProxyOptions,
    ) -> Result<Resource, RolloutError> {
        let name = options
            .name
            .unwrap_or_else(|| format!("{}_proxy", implementation.name()));
        let proxy = self.create_with(
            proxy_artifact,
            CreateOptions::named(name).args(options.args),
        )?;

        let current = self.call(&proxy, "implementation", [])?.address();
        let target = implementation.address();
        let upgrade = options.upgrade_operation;
        let on_upgrade = options.on_upgrade;
        self.run_if(current.equals(target.clone()).not(), |plan| match &on_upgrade {
            Some(hook) => hook.run(plan, &proxy),
            None => {
                plan.call(&proxy, &upgrade, [Arg::from(target)])?;
                Ok(())
            }
        })?;

        let behind = Resource::at(
            implementation.name(),
            Arc::clone(implementation.artifact()),
            proxy.address(),
        );
        if let Some(initializer) = options.initialize {
            self.run_if(current.equals(Address::ZERO), |plan| match initializer {
                Initializer::Operation(operation, args) => {
                    plan.call(&behind, &operation, args)?;
                    Ok(())
                }
                Initializer::With(hook) => hook.run(plan, &behind),
            })?;
        }
        Ok(behind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use rollout_abi::{Mutability, Operation, Param, ParamType};

    fn proxy_kind() -> Arc<Artifact> {
        Arc::new(
            Artifact::builder("Proxy")
                .operation(Operation::new(
                    "implementation",
                    vec![],
                    vec![Param::new("", ParamType::Address)],
                    Mutability::Read,
                ))
                .operation(Operation::new(
                    "upgradeTo",
                    vec![Param::new("next", ParamType::Address)],
                    vec![],
                    Mutability::Mutate,
                ))
                .build(),
        )
    }

    fn logic_kind() -> Arc<Artifact> {
        Arc::new(
            Artifact::builder("Logic")
                .operation(Operation::new(
                    "initialize",
                    vec![Param::new("owner", ParamType::Address)],
                    vec![],
                    Mutability::Mutate,
                ))
                .build(),
        )
    }

    #[test]
    fn proxy_records_guarded_upgrade_and_initializer() {
        let mut plan = Planner::new();
        let logic = plan.create(&logic_kind()).unwrap();
        let behind = plan
            .proxy(
                &proxy_kind(),
                &logic,
                ProxyOptions::default().initialize("initialize", [Arg::from(Address::ZERO)]),
            )
            .unwrap();
        assert_eq!(behind.name(), "logic");

        let kinds: Vec<&str> = plan.actions().iter().map(Action::kind).collect();
        assert_eq!(
            kinds,
            vec![
                "create",
                "create",
                "read",
                "conditional-start",
                "mutate",
                "conditional-end",
                "conditional-start",
                "mutate",
                "conditional-end",
            ]
        );
        assert!(matches!(&plan.actions()[1], Action::Create(create) if create.name == "logic_proxy"));
    }

    #[test]
    fn initializer_hook_records_its_calls_behind_the_proxy() {
        let mut plan = Planner::new();
        let logic = plan.create(&logic_kind()).unwrap();
        plan.proxy(
            &proxy_kind(),
            &logic,
            ProxyOptions::default().initialize_with(|plan, behind| {
                plan.call(behind, "initialize", [Arg::from(Address::ZERO)])?;
                plan.call(behind, "initialize", [Arg::from(Address::ZERO)])?;
                Ok(())
            }),
        )
        .unwrap();

        let guarded: Vec<&str> = plan.actions()[6..].iter().map(Action::kind).collect();
        assert_eq!(
            guarded,
            vec!["conditional-start", "mutate", "mutate", "conditional-end"]
        );
    }

    #[test]
    fn missing_upgrade_operation_is_a_usage_error() {
        let mut plan = Planner::new();
        let logic = plan.create(&logic_kind()).unwrap();
        let err = plan
            .proxy(
                &proxy_kind(),
                &logic,
                ProxyOptions::default().upgrade_operation("retarget"),
            )
            .unwrap_err();
        assert!(err.is_usage());
    }
}
