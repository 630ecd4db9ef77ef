use std::sync::{Arc, Mutex, PoisonError};

use crate::{LedgerDoc, LedgerResult, LedgerStore};

/// In-memory ledger; clones share the same document.
#[derive(Clone, Default)]
pub struct MemLedger {
    doc: Arc<Mutex<LedgerDoc>>,
}

impl std::fmt::Debug for MemLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemLedger")
            .field("networks", &self.snapshot().len())
            .finish()
    }
}

impl MemLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_doc(doc: LedgerDoc) -> Self {
        Self {
            doc: Arc::new(Mutex::new(doc)),
        }
    }

    pub fn snapshot(&self) -> LedgerDoc {
        self.doc
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LedgerStore for MemLedger {
    fn load(&self) -> LedgerResult<LedgerDoc> {
        Ok(self.snapshot())
    }

    fn store(&self, doc: &LedgerDoc) -> LedgerResult<()> {
        *self.doc.lock().unwrap_or_else(PoisonError::into_inner) = doc.clone();
        Ok(())
    }
}
