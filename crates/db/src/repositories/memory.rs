use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use wms_core::domain::confirmation::{MoConfirmation, PickConfirmation, RmaConfirmation};
use wms_core::errors::StoreError;
use wms_core::ingest::keys::{mo_key, pick_key_as, rma_key_as};
use wms_core::ingest::{CompositeKey, ConfirmationStore, KeyVariant, PickStore};

/// Record families the in-memory store can hold.
pub trait StoredConfirmation: Clone + Send + Sync + 'static {
    /// The record read through an explicit duplicate rule, so a probe matches
    /// the same rows the SQL count would.
    fn key_as(&self, variant: KeyVariant) -> Option<CompositeKey>;
    fn assign_id(&mut self, id: i64);
}

impl StoredConfirmation for MoConfirmation {
    fn key_as(&self, variant: KeyVariant) -> Option<CompositeKey> {
        (variant == KeyVariant::MoConfirmation).then(|| mo_key(self))
    }

    fn assign_id(&mut self, id: i64) {
        self.moid = Some(id);
    }
}

impl StoredConfirmation for PickConfirmation {
    fn key_as(&self, variant: KeyVariant) -> Option<CompositeKey> {
        pick_key_as(variant, self)
    }

    fn assign_id(&mut self, id: i64) {
        self.serial_id = Some(id);
    }
}

impl StoredConfirmation for RmaConfirmation {
    fn key_as(&self, variant: KeyVariant) -> Option<CompositeKey> {
        rma_key_as(variant, self)
    }

    fn assign_id(&mut self, id: i64) {
        self.rma_id = Some(id);
    }
}

pub struct InMemoryConfirmationRepository<R> {
    rows: RwLock<Vec<R>>,
    fail_next_commit: AtomicBool,
}

pub type InMemoryPickRepository = InMemoryConfirmationRepository<PickConfirmation>;

impl<R> Default for InMemoryConfirmationRepository<R> {
    fn default() -> Self {
        Self { rows: RwLock::new(Vec::new()), fail_next_commit: AtomicBool::new(false) }
    }
}

impl<R: StoredConfirmation> InMemoryConfirmationRepository<R> {
    /// The next `commit_all` fails and keeps nothing.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl<R: StoredConfirmation> ConfirmationStore<R> for InMemoryConfirmationRepository<R> {
    async fn count_matching(&self, key: &CompositeKey) -> Result<i64, StoreError> {
        let rows = self.rows.read().await;
        let matching = rows
            .iter()
            .filter(|row| row.key_as(key.variant()).as_ref().is_some_and(|stored| stored == key))
            .count();
        Ok(matching as i64)
    }

    async fn commit_all(&self, records: Vec<R>) -> Result<Vec<R>, StoreError> {
        let mut rows = self.rows.write().await;
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Database("injected commit failure".to_string()));
        }

        let mut next_id = rows.len() as i64 + 1;
        let committed: Vec<R> = records
            .into_iter()
            .map(|mut record| {
                record.assign_id(next_id);
                next_id += 1;
                record
            })
            .collect();
        rows.extend(committed.iter().cloned());
        Ok(committed)
    }

    async fn list_all(&self) -> Result<Vec<R>, StoreError> {
        Ok(self.rows.read().await.clone())
    }
}

#[async_trait]
impl PickStore for InMemoryPickRepository {
    async fn count_for_delivery_detail(
        &self,
        delivery_detail_id: i64,
    ) -> Result<i64, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|row| row.delivery_detail_id == Some(delivery_detail_id)).count()
            as i64)
    }
}
