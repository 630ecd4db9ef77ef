use rollout_ledger::TxRecord;

use super::Executor;
use crate::action::TxOverrides;
use crate::client::{Fee, Receipt, Transaction};
use crate::error::RolloutError;

impl Executor<'_> {
    /// Estimates, sends and waits for one direct transaction.
    pub(super) async fn transact(
        &self,
        label: &str,
        tx: &Transaction,
        overrides: &TxOverrides,
    ) -> Result<Receipt, RolloutError> {
        let chain = &self.services.chain;
        let estimate = chain
            .estimate_fee(tx)
            .await
            .map_err(|err| RolloutError::chain(label, err))?;
        let fee = apply_overrides(estimate, overrides, self.config.gas_price.as_ref());

        log::info!("Transaction: {label}");
        log::info!(
            "Fee: {} wei (gas limit {}, gas price {})",
            fee.total(),
            fee.gas_limit,
            fee.gas_price
        );
        let tx_hash = chain
            .send(tx, &fee)
            .await
            .map_err(|err| RolloutError::chain(label, err))?;
        log::info!("Hash: {tx_hash}");
        let receipt = chain
            .wait(tx_hash)
            .await
            .map_err(|err| RolloutError::chain(label, err))?;
        log::info!("Block: {}", receipt.block_number);
        if let Some(address) = receipt.created_address {
            log::info!("Address: {address}");
        }

        if let Some(journal) = &self.journal {
            journal.append(&TxRecord {
                label: label.to_owned(),
                network: self.config.network.clone(),
                tx_hash: receipt.tx_hash,
                block_number: receipt.block_number,
                created_address: receipt.created_address,
                gas_limit: fee.gas_limit,
                gas_price: fee.gas_price,
            })?;
        }
        Ok(receipt)
    }
}

/// Per-action overrides win over the configured gas price, which wins over the estimate.
fn apply_overrides(
    estimate: Fee,
    overrides: &TxOverrides,
    configured_price: Option<&alloy_primitives::U256>,
) -> Fee {
    Fee {
        gas_limit: overrides.gas_limit.unwrap_or(estimate.gas_limit),
        gas_price: overrides
            .gas_price
            .or(configured_price.copied())
            .unwrap_or(estimate.gas_price),
    }
}
