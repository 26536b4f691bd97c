use async_trait::async_trait;
use serde_json::Value;

use crate::domain::confirmation::PickConfirmation;
use crate::errors::StoreError;
use crate::ingest::keys::CompositeKey;

/// Persistence contract shared by the three confirmation tables.
#[async_trait]
pub trait ConfirmationStore<R>: Send + Sync
where
    R: Send + 'static,
{
    /// Rows whose key columns equal the key's rendered values.
    async fn count_matching(&self, key: &CompositeKey) -> Result<i64, StoreError>;

    /// Inserts every record inside one unit of work and returns them with
    /// store-assigned identifiers, in input order. Nothing is kept when any
    /// insert fails.
    async fn commit_all(&self, records: Vec<R>) -> Result<Vec<R>, StoreError>;

    async fn list_all(&self) -> Result<Vec<R>, StoreError>;
}

#[async_trait]
pub trait PickStore: ConfirmationStore<PickConfirmation> {
    /// Persisted pick rows for one delivery detail, across all submissions.
    async fn count_for_delivery_detail(&self, delivery_detail_id: i64)
        -> Result<i64, StoreError>;
}

/// External locator check. Returns the first result row rendered as text, or
/// `None` when the procedure produced no rows.
#[async_trait]
pub trait LocationProcedure: Send + Sync {
    async fn check(&self, subinventory: &str, locator: &str)
        -> Result<Option<String>, StoreError>;
}

/// The two output parameters of the quick-pick procedure, each already
/// rendered as text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuickPickOutput {
    pub p_mes: Option<String>,
    pub p_mes2: Option<String>,
}

#[async_trait]
pub trait QuickPickProcedure: Send + Sync {
    async fn submit(&self, payload: &Value) -> Result<QuickPickOutput, StoreError>;
}
