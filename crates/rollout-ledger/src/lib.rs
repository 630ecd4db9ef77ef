//! Deployment ledger: the per-network, per-resource record that makes re-runs idempotent,
//! plus the cross-run batch section and the append-only transaction journal.

mod fs_ledger;
mod journal;
mod mem_ledger;
mod records;

pub use fs_ledger::FsLedger;
pub use journal::{TxJournal, TxRecord};
pub use mem_ledger::MemLedger;
pub use records::{BatchCall, BatchRecord, BatchState, ResourceRecord};

use indexmap::IndexMap;
use serde::{Serialize, de::DeserializeOwned};
use std::{io, path::PathBuf, sync::Arc};

/// Reserved per-network key holding batch records instead of a resource.
pub const BATCH_SECTION: &str = "_multisig";

pub type LedgerResult<T> = Result<T, LedgerError>;
pub type DynLedger = Arc<dyn LedgerStore>;

/// Resource name (or [`BATCH_SECTION`]) to raw record.
pub type NetworkSection = IndexMap<String, serde_json::Value>;
/// Network name to section; the whole persisted document.
pub type LedgerDoc = IndexMap<String, NetworkSection>;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("ledger {path:?} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed record '{network}/{name}': {source}")]
    Record {
        network: String,
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("'{0}' is reserved for batch records")]
    ReservedName(String),
}

/// Read-modify-write access to a ledger document.
///
/// Backends implement whole-document `load`/`store`; the record helpers are
/// shared and each one writes back immediately.
pub trait LedgerStore: Send + Sync {
    fn load(&self) -> LedgerResult<LedgerDoc>;
    fn store(&self, doc: &LedgerDoc) -> LedgerResult<()>;

    fn networks(&self) -> LedgerResult<Vec<String>> {
        Ok(self.load()?.keys().cloned().collect())
    }

    fn resource(&self, network: &str, name: &str) -> LedgerResult<Option<ResourceRecord>> {
        ensure_not_reserved(name)?;
        let doc = self.load()?;
        doc.get(network)
            .and_then(|section| section.get(name))
            .map(|raw| decode_record(network, name, raw))
            .transpose()
    }

    fn resources(&self, network: &str) -> LedgerResult<IndexMap<String, ResourceRecord>> {
        let doc = self.load()?;
        let Some(section) = doc.get(network) else {
            return Ok(IndexMap::new());
        };
        section
            .iter()
            .filter(|(name, _)| name.as_str() != BATCH_SECTION)
            .map(|(name, raw)| Ok((name.clone(), decode_record(network, name, raw)?)))
            .collect()
    }

    fn put_resource(&self, network: &str, name: &str, record: &ResourceRecord) -> LedgerResult<()> {
        ensure_not_reserved(name)?;
        let raw = encode_record(network, name, record)?;
        let mut doc = self.load()?;
        doc.entry(network.to_owned())
            .or_default()
            .insert(name.to_owned(), raw);
        self.store(&doc)
    }

    /// Returns whether a record was present.
    fn remove_resource(&self, network: &str, name: &str) -> LedgerResult<bool> {
        ensure_not_reserved(name)?;
        let mut doc = self.load()?;
        let removed = doc
            .get_mut(network)
            .and_then(|section| section.shift_remove(name))
            .is_some();
        if removed {
            self.store(&doc)?;
        }
        Ok(removed)
    }

    fn batches(&self, network: &str) -> LedgerResult<IndexMap<String, BatchRecord>> {
        let doc = self.load()?;
        match doc.get(network).and_then(|section| section.get(BATCH_SECTION)) {
            Some(raw) => decode_record(network, BATCH_SECTION, raw),
            None => Ok(IndexMap::new()),
        }
    }

    fn batch(&self, network: &str, name: &str) -> LedgerResult<Option<BatchRecord>> {
        Ok(self.batches(network)?.shift_remove(name))
    }

    fn put_batch(&self, network: &str, name: &str, record: &BatchRecord) -> LedgerResult<()> {
        let mut batches = self.batches(network)?;
        batches.insert(name.to_owned(), record.clone());
        let raw = encode_record(network, BATCH_SECTION, &batches)?;
        let mut doc = self.load()?;
        doc.entry(network.to_owned())
            .or_default()
            .insert(BATCH_SECTION.to_owned(), raw);
        self.store(&doc)
    }
}

fn ensure_not_reserved(name: &str) -> LedgerResult<()> {
    if name == BATCH_SECTION {
        return Err(LedgerError::ReservedName(name.to_owned()));
    }
    Ok(())
}

fn decode_record<T: DeserializeOwned>(
    network: &str,
    name: &str,
    raw: &serde_json::Value,
) -> LedgerResult<T> {
    serde_json::from_value(raw.clone()).map_err(|source| LedgerError::Record {
        network: network.to_owned(),
        name: name.to_owned(),
        source,
    })
}

fn encode_record<T: Serialize>(network: &str, name: &str, record: &T) -> LedgerResult<serde_json::Value> {
    serde_json::to_value(record).map_err(|source| LedgerError::Record {
        network: network.to_owned(),
        name: name.to_owned(),
        source,
    })
}

pub(crate) fn io_error(path: impl Into<PathBuf>, err: io::Error) -> LedgerError {
    LedgerError::Io {
        path: path.into(),
        source: err,
    }
}
