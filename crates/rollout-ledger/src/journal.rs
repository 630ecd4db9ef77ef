use std::{
    fs::{self, File, OpenOptions},
    io::{BufRead, BufReader, ErrorKind, Write},
    path::{Path, PathBuf},
};

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::{LedgerError, LedgerResult, io_error};

/// One broadcast transaction as recorded in the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRecord {
    pub label: String,
    pub network: String,
    pub tx_hash: B256,
    pub block_number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_address: Option<Address>,
    pub gas_limit: u64,
    pub gas_price: U256,
}

/// Append-only JSON-lines log of every transaction a run broadcasts.
#[derive(Debug, Clone)]
pub struct TxJournal {
    path: PathBuf,
}

impl TxJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &TxRecord) -> LedgerResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        let mut line = serde_json::to_string(record).map_err(|source| LedgerError::Parse {
            path: self.path.clone(),
            source,
        })?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| io_error(&self.path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| io_error(&self.path, e))?;
        file.sync_all().map_err(|e| io_error(&self.path, e))?;
        Ok(())
    }

    pub fn read_all(&self) -> LedgerResult<Vec<TxRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_error(&self.path, err)),
        };
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| io_error(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|source| LedgerError::Parse {
                path: self.path.clone(),
                source,
            })?;
            records.push(record);
        }
        Ok(records)
    }
}
