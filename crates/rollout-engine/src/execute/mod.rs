//! Execution pass: walks the recorded actions once, in order, performing each
//! side effect and binding result slots as it goes.

mod batch;
mod transact;

use alloy_primitives::{Address, Bytes, U256};
use rollout_ledger::{ResourceRecord, TxJournal};
use rollout_values::{Arg, Value};

use crate::action::{Action, CallAction, CreateAction, EncodeAction, Note, StorageAction, next_depth};
use crate::batch::BatchAggregator;
use crate::config::DeployConfig;
use crate::client::{ChainError, Transaction};
use crate::deploy::{BatchHalt, RunStatus, Services};
use crate::error::{RolloutError, UsageError};
use crate::verify::verify_creation;

/// Whether the walk goes on after an action.
pub(crate) enum Flow {
    Continue,
    Halt(BatchHalt),
}

pub(crate) struct Executor<'a> {
    config: &'a DeployConfig,
    services: &'a Services,
    signer: Address,
    journal: Option<TxJournal>,
    batch: Option<BatchAggregator>,
    annotations: Vec<String>,
}

impl<'a> Executor<'a> {
    pub fn new(config: &'a DeployConfig, services: &'a Services, signer: Address) -> Self {
        Self {
            config,
            services,
            signer,
            journal: config.tx_log.as_ref().map(TxJournal::new),
            batch: None,
            annotations: Vec::new(),
        }
    }

    pub fn into_annotations(self) -> Vec<String> {
        self.annotations
    }

    pub async fn run(&mut self, actions: &[Action]) -> Result<RunStatus, RolloutError> {
        let implicit = self.config.implicit_batch().map(str::to_owned);
        if let Some(name) = &implicit {
            self.open_batch(name)?;
        }

        let mut depth = 0;
        for action in actions {
            if depth > 0 {
                log::debug!("suppressed: {action}");
                depth = next_depth(depth, action)?;
                continue;
            }
            if let Action::ConditionalStart(_) = action {
                depth = next_depth(depth, action).map_err(UsageError::UnresolvedCondition)?;
                if depth > 0 {
                    log::debug!("condition false, suppressing block");
                }
                continue;
            }
            if let Flow::Halt(halt) = self.step(action).await? {
                return Ok(RunStatus::Halted(halt));
            }
        }

        if let Some(name) = &implicit {
            if let Flow::Halt(halt) = self.close_batch(name).await? {
                return Ok(RunStatus::Halted(halt));
            }
        }
        Ok(RunStatus::Completed)
    }

    async fn step(&mut self, action: &Action) -> Result<Flow, RolloutError> {
        match action {
            Action::Create(create) => self.create(create).await?,
            Action::Read(call) => self.read(call).await?,
            Action::Mutate(call) => self.mutate(call).await?,
            Action::Encode(encode) => self.encode(encode)?,
            Action::ReadStorage(storage) => self.read_storage(storage).await?,
            Action::Annotate(notes) => self.annotate(notes)?,
            Action::RecordExisting { name, address } => {
                let record = ResourceRecord {
                    address: address.resolve()?,
                    creation_tx_hash: None,
                    is_batched: false,
                };
                self.save(name, &record)?;
            }
            Action::BatchStart(name) => self.open_batch(name)?,
            Action::BatchEnd(name) => return self.close_batch(name).await,
            // Conditional starts are handled by the walk itself.
            Action::ConditionalStart(_) | Action::ConditionalEnd => {}
        }
        Ok(Flow::Continue)
    }

    async fn create(&mut self, create: &CreateAction) -> Result<(), RolloutError> {
        let label = format!("create {}", create.name);
        let args = Arg::resolve_all(&create.args)?;
        let payload = create
            .artifact
            .creation_payload(&args)
            .map_err(|err| RolloutError::codec(&label, err))?;

        let network = &self.config.network;
        if let Some(existing) = self.services.ledger.resource(network, &create.name)? {
            if self.reusable(create, &existing).await? {
                log::info!("reusing {} at {}", create.name, existing.address);
                create.address.fill(existing.address)?;
                if !existing.is_batched || self.batch.is_none() {
                    self.verify(create, &args, existing.address).await;
                }
                return Ok(());
            }
        }

        let value = create.overrides.value.unwrap_or(U256::ZERO);
        let record = if let Some(batch) = self.batch.as_mut() {
            // The proposal is fixed; a creation it lacks would never land.
            if batch.is_settled() {
                return Err(UsageError::SettledBatchChanged {
                    batch: batch.name().to_owned(),
                    action: label,
                }
                .into());
            }
            let salt = self.services.salts.next_salt().map_err(RolloutError::Salt)?;
            let address = batch.queue_creation(&payload, salt, value);
            log::info!(
                "queued {} into batch '{}' at {address}",
                create.name,
                batch.name()
            );
            ResourceRecord {
                address,
                creation_tx_hash: None,
                is_batched: true,
            }
        } else {
            let tx = Transaction {
                to: None,
                data: payload,
                value,
            };
            let receipt = self.transact(&label, &tx, &create.overrides).await?;
            let address = receipt.created_address.ok_or_else(|| {
                RolloutError::chain(
                    &label,
                    ChainError::MissingCreatedAddress(receipt.tx_hash),
                )
            })?;
            ResourceRecord {
                address,
                creation_tx_hash: Some(receipt.tx_hash),
                is_batched: false,
            }
        };

        create.address.fill(record.address)?;
        self.save(&create.name, &record)?;
        if !record.is_batched {
            self.verify(create, &args, record.address).await;
        }
        Ok(())
    }

    /// Idempotence check for a create that already has a ledger record.
    async fn reusable(
        &self,
        create: &CreateAction,
        existing: &ResourceRecord,
    ) -> Result<bool, RolloutError> {
        if create.skip_upgrade {
            return Ok(true);
        }
        // Already handed to the approval service in an earlier run.
        if existing.is_batched && self.batch.as_ref().is_some_and(BatchAggregator::is_settled) {
            return Ok(true);
        }
        let code = self
            .services
            .chain
            .get_code(existing.address)
            .await
            .map_err(|err| RolloutError::chain(format!("get code of {}", create.name), err))?;
        let unchanged = !code.is_empty()
            && rollout_abi::code_fingerprint(&code) == create.artifact.code_fingerprint();
        if !unchanged {
            log::info!("{} changed since {}, creating again", create.name, existing.address);
        }
        Ok(unchanged)
    }

    async fn read(&mut self, call: &CallAction) -> Result<(), RolloutError> {
        let label = format!("{}.{}", call.resource, call.operation.name);
        let target = call.target.resolve()?;
        let data = encode_call(call, &label)?;
        let mut raw = self
            .services
            .chain
            .call(target, &data)
            .await
            .map_err(|err| RolloutError::chain(&label, err))?;
        // No code at the target yet (a queued batch creation): read as zeroes.
        if raw.is_empty() && !call.operation.outputs.is_empty() {
            raw = Bytes::from(vec![0u8; 32 * call.operation.outputs.len()]);
        }
        let value = call
            .operation
            .decode_output(&raw)
            .map_err(|err| RolloutError::codec(&label, err))?;
        call.result.fill(value)?;
        Ok(())
    }

    async fn mutate(&mut self, call: &CallAction) -> Result<(), RolloutError> {
        let label = format!("{}.{}", call.resource, call.operation.name);
        let target = call.target.resolve()?;
        let data = encode_call(call, &label)?;
        let value = call.overrides.value.unwrap_or(U256::ZERO);

        if let Some(batch) = self.batch.as_mut() {
            if batch.is_settled() {
                if !batch.claim_call(target, &data) {
                    return Err(UsageError::SettledBatchChanged {
                        batch: batch.name().to_owned(),
                        action: label,
                    }
                    .into());
                }
                log::info!("{label} already submitted with batch '{}'", batch.name());
            } else {
                batch.queue_call(target, data, value);
                log::info!("queued {label} into batch '{}'", batch.name());
            }
            call.result.fill(Value::Unit)?;
            return Ok(());
        }

        let tx = Transaction {
            to: Some(target),
            data,
            value,
        };
        let receipt = self.transact(&label, &tx, &call.overrides).await?;
        call.result.fill(Value::from(receipt.tx_hash))?;
        Ok(())
    }

    fn encode(&mut self, encode: &EncodeAction) -> Result<(), RolloutError> {
        let args = Arg::resolve_all(&encode.args)?;
        let data = encode
            .operation
            .encode_call(&args)
            .map_err(|err| RolloutError::codec(format!("encode {}", encode.operation.name), err))?;
        encode.result.fill(data)?;
        Ok(())
    }

    async fn read_storage(&mut self, storage: &StorageAction) -> Result<(), RolloutError> {
        let target = storage.target.resolve()?;
        let word = self
            .services
            .chain
            .get_storage_at(target, storage.key)
            .await
            .map_err(|err| {
                RolloutError::chain(format!("read storage {} at {target}", storage.key), err)
            })?;
        storage
            .result
            .fill(Bytes::copy_from_slice(word.as_slice()))?;
        Ok(())
    }

    fn annotate(&mut self, notes: &[Note]) -> Result<(), RolloutError> {
        let parts = notes
            .iter()
            .map(Note::render)
            .collect::<Result<Vec<_>, _>>()?;
        let line = parts.join(" ");
        log::info!("{line}");
        self.annotations.push(line);
        Ok(())
    }

    fn save(&self, name: &str, record: &ResourceRecord) -> Result<(), RolloutError> {
        if self.config.dry_run {
            log::debug!("dry run: not recording {name}");
            return Ok(());
        }
        self.services
            .ledger
            .put_resource(&self.config.network, name, record)?;
        Ok(())
    }

    async fn verify(&self, create: &CreateAction, args: &[Value], address: Address) {
        if !self.config.verify {
            return;
        }
        let Some(verifier) = &self.services.verifier else {
            return;
        };
        verify_creation(
            verifier.as_ref(),
            &create.artifact,
            args,
            address,
            &self.config.network,
        )
        .await;
    }
}

fn encode_call(call: &CallAction, label: &str) -> Result<Bytes, RolloutError> {
    let args = Arg::resolve_all(&call.args)?;
    call.operation
        .encode_call(&args)
        .map_err(|err| RolloutError::codec(label, err))
}
