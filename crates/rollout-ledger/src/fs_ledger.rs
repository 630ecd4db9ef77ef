use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::{LedgerDoc, LedgerError, LedgerResult, LedgerStore, io_error};

/// Ledger backed by one pretty-printed JSON file.
///
/// A missing or empty file reads as an empty ledger. Writes go to a sibling
/// temp file that is renamed over the original, so a crash never leaves a
/// truncated document behind.
#[derive(Debug, Clone)]
pub struct FsLedger {
    path: PathBuf,
}

impl FsLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl LedgerStore for FsLedger {
    fn load(&self) -> LedgerResult<LedgerDoc> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(LedgerDoc::new()),
            Err(err) => return Err(io_error(&self.path, err)),
        };
        if text.trim().is_empty() {
            return Ok(LedgerDoc::new());
        }
        serde_json::from_str(&text).map_err(|source| LedgerError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn store(&self, doc: &LedgerDoc) -> LedgerResult<()> {
        let dir = self.parent_dir();
        fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;
        let mut text = serde_json::to_string_pretty(doc).map_err(|source| LedgerError::Parse {
            path: self.path.clone(),
            source,
        })?;
        text.push('\n');

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| io_error(&dir, e))?;
        tmp.write_all(text.as_bytes())
            .map_err(|e| io_error(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| io_error(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| io_error(&self.path, e.error))?;
        log::debug!("ledger written to {}", self.path.display());
        Ok(())
    }
}
