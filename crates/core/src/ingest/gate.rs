use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

/// Tables whose check-then-insert sequence can be serialised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum GatedTable {
    Mo,
    Pick,
    Rma,
}

/// In-process serialisation of duplicate probing and insertion per table.
///
/// While a guard is held no other caller in this process can probe or commit
/// the same table, so two concurrent batches cannot both accept one key.
/// Separate processes sharing a database are not covered.
#[derive(Clone, Debug)]
pub struct IngestionGate {
    enabled: bool,
    mo: Arc<Mutex<()>>,
    pick: Arc<Mutex<()>>,
    rma: Arc<Mutex<()>>,
}

pub struct GateGuard<'a> {
    _held: Vec<MutexGuard<'a, ()>>,
}

impl IngestionGate {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            mo: Arc::new(Mutex::new(())),
            pick: Arc::new(Mutex::new(())),
            rma: Arc::new(Mutex::new(())),
        }
    }

    /// Locks are always taken in `Mo`, `Pick`, `Rma` order regardless of the
    /// order requested.
    pub async fn enter(&self, tables: &[GatedTable]) -> GateGuard<'_> {
        if !self.enabled {
            return GateGuard { _held: Vec::new() };
        }

        let mut ordered = tables.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut held = Vec::with_capacity(ordered.len());
        for table in ordered {
            let lock = match table {
                GatedTable::Mo => &self.mo,
                GatedTable::Pick => &self.pick,
                GatedTable::Rma => &self.rma,
            };
            held.push(lock.lock().await);
        }
        GateGuard { _held: held }
    }
}

impl Default for IngestionGate {
    fn default() -> Self {
        Self::new(true)
    }
}
