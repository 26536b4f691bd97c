use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

/// Module tags written to the mobile transaction log.
pub mod modules {
    pub const MO_CONFIRM: &str = "moConfirm";
    pub const PICK_CONFIRM: &str = "pickConfirm";
    pub const PO_CONFIRM: &str = "poConfirm";
    pub const MO_PICK_CONFIRM: &str = "moPickConfirm";
    pub const MO_QUICK_CONFIRM: &str = "moQuickConfirm";
    pub const PO_QUICK_CONFIRM: &str = "poQuickConfirm";
    pub const MO_QUICK_PICK_JSON: &str = "moQuickPickJson";
    pub const RMA_CONFIRM: &str = "rmaConfirm";
    pub const RMA_INSERT: &str = "RMA - insertmo";
    pub const ITEM_CHECK_DISPATCH: &str = "Item Check Dispatch";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionLogEntry {
    pub id: Option<i64>,
    pub module: String,
    pub request: String,
    pub response: Option<String>,
    pub processed_at: DateTime<Utc>,
}

impl TransactionLogEntry {
    pub fn new(module: impl Into<String>, request: impl Into<String>) -> Self {
        Self {
            id: None,
            module: module.into(),
            request: request.into(),
            response: None,
            processed_at: Utc::now(),
        }
    }
}

/// Append-only audit trail. Entries are opened when an operation starts and
/// receive their response exactly once.
#[async_trait]
pub trait TransactionLog: Send + Sync {
    async fn append(&self, entry: TransactionLogEntry) -> Result<i64, StoreError>;
    async fn set_response(&self, id: i64, response: String) -> Result<(), StoreError>;
    async fn recent(&self, limit: u32) -> Result<Vec<TransactionLogEntry>, StoreError>;
}

#[derive(Clone, Default)]
pub struct InMemoryTransactionLog {
    entries: Arc<Mutex<Vec<TransactionLogEntry>>>,
}

impl InMemoryTransactionLog {
    pub fn entries(&self) -> Vec<TransactionLogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn entries_for(&self, module: &str) -> Vec<TransactionLogEntry> {
        self.entries().into_iter().filter(|entry| entry.module == module).collect()
    }
}

#[async_trait]
impl TransactionLog for InMemoryTransactionLog {
    async fn append(&self, mut entry: TransactionLogEntry) -> Result<i64, StoreError> {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        let id = entries.len() as i64 + 1;
        entry.id = Some(id);
        entries.push(entry);
        Ok(id)
    }

    async fn set_response(&self, id: i64, response: String) -> Result<(), StoreError> {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        match entries.iter_mut().find(|entry| entry.id == Some(id)) {
            Some(entry) => {
                entry.response = Some(response);
                Ok(())
            }
            None => Err(StoreError::Database(format!("transaction log entry {id} not found"))),
        }
    }

    async fn recent(&self, limit: u32) -> Result<Vec<TransactionLogEntry>, StoreError> {
        let mut entries = self.entries();
        entries.reverse();
        entries.truncate(limit as usize);
        Ok(entries)
    }
}
