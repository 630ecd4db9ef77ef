use std::path::PathBuf;

use alloy_primitives::{Address, U256};

use crate::error::ConfigError;

pub const DEFAULT_NETWORK: &str = "default";
pub const DEFAULT_LEDGER: &str = "deployments.json";

/// Where batched operations are routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Deployer of record for salted creations (`performCreate2`).
    pub factory: Address,
    /// Approving account the proposals are submitted to.
    pub safe: Address,
    /// When set, every creation and mutation outside explicit brackets is
    /// queued into one batch of this name, proposed after the last action.
    pub implicit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub network: String,
    pub ledger_path: PathBuf,
    /// Send transactions but never write the ledger or submit proposals.
    pub dry_run: bool,
    /// Replaces the estimated gas price when set.
    pub gas_price: Option<U256>,
    /// JSON-lines journal of broadcast transactions.
    pub tx_log: Option<PathBuf>,
    pub verify: bool,
    pub batch: Option<BatchConfig>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            network: DEFAULT_NETWORK.into(),
            ledger_path: PathBuf::from(DEFAULT_LEDGER),
            dry_run: false,
            gas_price: None,
            tx_log: None,
            verify: false,
            batch: None,
        }
    }
}

impl DeployConfig {
    /// Build from `ROLLOUT_*` environment variables on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());
        let mut config = DeployConfig::default();

        if let Some(network) = get("ROLLOUT_NETWORK") {
            config.network = network;
        }
        if let Some(path) = get("ROLLOUT_LEDGER") {
            config.ledger_path = PathBuf::from(path);
        }
        if let Some(raw) = get("ROLLOUT_DRY_RUN") {
            config.dry_run = parse_flag("ROLLOUT_DRY_RUN", &raw)?;
        }
        if let Some(raw) = get("ROLLOUT_GAS_PRICE") {
            config.gas_price = Some(parse_wei("ROLLOUT_GAS_PRICE", &raw)?);
        }
        config.tx_log = get("ROLLOUT_TX_LOG").map(PathBuf::from);
        if let Some(raw) = get("ROLLOUT_VERIFY") {
            config.verify = parse_flag("ROLLOUT_VERIFY", &raw)?;
        }

        let factory = get("ROLLOUT_BATCH_FACTORY")
            .map(|raw| parse_address("ROLLOUT_BATCH_FACTORY", &raw))
            .transpose()?;
        let safe = get("ROLLOUT_BATCH_SAFE")
            .map(|raw| parse_address("ROLLOUT_BATCH_SAFE", &raw))
            .transpose()?;
        let implicit = get("ROLLOUT_BATCH_IMPLICIT");
        config.batch = match (factory, safe) {
            (Some(factory), Some(safe)) => Some(BatchConfig {
                factory,
                safe,
                implicit,
            }),
            (None, None) if implicit.is_none() => None,
            (None, _) => {
                return Err(ConfigError::PartialBatch {
                    missing: "ROLLOUT_BATCH_FACTORY",
                });
            }
            (_, None) => {
                return Err(ConfigError::PartialBatch {
                    missing: "ROLLOUT_BATCH_SAFE",
                });
            }
        };

        Ok(config)
    }

    pub fn implicit_batch(&self) -> Option<&str> {
        self.batch.as_ref().and_then(|batch| batch.implicit.as_deref())
    }
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(var, raw, "boolean")),
    }
}

fn parse_wei(var: &'static str, raw: &str) -> Result<U256, ConfigError> {
    U256::from_str_radix(raw.trim(), 10).map_err(|_| invalid(var, raw, "decimal wei amount"))
}

fn parse_address(var: &'static str, raw: &str) -> Result<Address, ConfigError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|_| invalid(var, raw, "address"))
}

fn invalid(var: &'static str, raw: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        var,
        value: raw.to_owned(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = DeployConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, DeployConfig::default());
        assert_eq!(config.network, "default");
        assert_eq!(config.ledger_path, PathBuf::from("deployments.json"));
    }

    #[test]
    fn reads_every_variable() {
        let config = DeployConfig::from_lookup(lookup(&[
            ("ROLLOUT_NETWORK", "sepolia"),
            ("ROLLOUT_LEDGER", "out/ledger.json"),
            ("ROLLOUT_DRY_RUN", "yes"),
            ("ROLLOUT_GAS_PRICE", "1000000000"),
            ("ROLLOUT_TX_LOG", "tx.jsonl"),
            ("ROLLOUT_VERIFY", "1"),
            ("ROLLOUT_BATCH_FACTORY", "0x1111111111111111111111111111111111111111"),
            ("ROLLOUT_BATCH_SAFE", "0x2222222222222222222222222222222222222222"),
            ("ROLLOUT_BATCH_IMPLICIT", "all"),
        ]))
        .unwrap();
        assert_eq!(config.network, "sepolia");
        assert!(config.dry_run && config.verify);
        assert_eq!(config.gas_price, Some(U256::from(1_000_000_000u64)));
        assert_eq!(config.tx_log, Some(PathBuf::from("tx.jsonl")));
        let batch = config.batch.as_ref().unwrap();
        assert_eq!(batch.factory, Address::repeat_byte(0x11));
        assert_eq!(batch.safe, Address::repeat_byte(0x22));
        assert_eq!(config.implicit_batch(), Some("all"));
    }

    #[test]
    fn partial_batch_configuration_is_rejected() {
        let err = DeployConfig::from_lookup(lookup(&[(
            "ROLLOUT_BATCH_FACTORY",
            "0x1111111111111111111111111111111111111111",
        )]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::PartialBatch {
                missing: "ROLLOUT_BATCH_SAFE"
            }
        ));
        let err =
            DeployConfig::from_lookup(lookup(&[("ROLLOUT_BATCH_IMPLICIT", "all")])).unwrap_err();
        assert!(matches!(err, ConfigError::PartialBatch { .. }));
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = DeployConfig::from_lookup(lookup(&[("ROLLOUT_GAS_PRICE", "cheap")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { var: "ROLLOUT_GAS_PRICE", .. }
        ));
        let err = DeployConfig::from_lookup(lookup(&[("ROLLOUT_DRY_RUN", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "ROLLOUT_DRY_RUN", .. }));
    }
}
