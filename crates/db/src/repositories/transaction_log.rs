use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};

use wms_core::audit::{TransactionLog, TransactionLogEntry};
use wms_core::errors::StoreError;

use super::{parse_timestamp, RepositoryError};
use crate::DbPool;

/// `mob_trans_log` backed audit trail.
pub struct SqlTransactionLog {
    pool: DbPool,
}

impl SqlTransactionLog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, entry: TransactionLogEntry) -> Result<i64, RepositoryError> {
        let row = sqlx::query(
            "INSERT INTO mob_trans_log (module, request, response, processed_at)
             VALUES (?, ?, ?, ?)
             RETURNING id",
        )
        .bind(entry.module)
        .bind(entry.request)
        .bind(entry.response)
        .bind(entry.processed_at.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("id")?)
    }

    async fn update_response(&self, id: i64, response: String) -> Result<u64, RepositoryError> {
        let result = sqlx::query("UPDATE mob_trans_log SET response = ? WHERE id = ?")
            .bind(response)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn fetch_recent(&self, limit: u32) -> Result<Vec<TransactionLogEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, module, request, response, processed_at
             FROM mob_trans_log
             ORDER BY id DESC
             LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(log_entry_from_row).collect()
    }
}

#[async_trait]
impl TransactionLog for SqlTransactionLog {
    async fn append(&self, entry: TransactionLogEntry) -> Result<i64, StoreError> {
        Ok(self.insert(entry).await?)
    }

    async fn set_response(&self, id: i64, response: String) -> Result<(), StoreError> {
        match self.update_response(id, response).await? {
            0 => Err(StoreError::Database(format!("transaction log entry {id} not found"))),
            _ => Ok(()),
        }
    }

    async fn recent(&self, limit: u32) -> Result<Vec<TransactionLogEntry>, StoreError> {
        Ok(self.fetch_recent(limit).await?)
    }
}

fn log_entry_from_row(row: SqliteRow) -> Result<TransactionLogEntry, RepositoryError> {
    Ok(TransactionLogEntry {
        id: Some(row.try_get("id")?),
        module: row.try_get("module")?,
        request: row.try_get("request")?,
        response: row.try_get("response")?,
        processed_at: parse_timestamp("processed_at", row.try_get("processed_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use wms_core::audit::{modules, TransactionLog, TransactionLogEntry};

    use super::SqlTransactionLog;
    use crate::{connect_with_settings, migrations};

    async fn setup_pool() -> crate::DbPool {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 30).await.expect("pool should connect");
        migrations::run_pending(&pool).await.expect("migrations should run");
        pool
    }

    #[tokio::test]
    async fn entries_open_without_response_and_close_once_answered() {
        let log = SqlTransactionLog::new(setup_pool().await);
        let first = log
            .append(TransactionLogEntry::new(modules::PICK_CONFIRM, "[]"))
            .await
            .expect("append");
        let second = log
            .append(TransactionLogEntry::new(modules::RMA_INSERT, "[{\"rmaId\":null}]"))
            .await
            .expect("append");

        log.set_response(first, "{\"status\":200}".to_string()).await.expect("respond");

        let recent = log.recent(10).await.expect("recent");
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, Some(second));
        assert_eq!(recent[0].module, "RMA - insertmo");
        assert_eq!(recent[0].response, None);
        assert_eq!(recent[1].response.as_deref(), Some("{\"status\":200}"));
    }

    #[tokio::test]
    async fn answering_an_unknown_entry_fails() {
        let log = SqlTransactionLog::new(setup_pool().await);
        assert!(log.set_response(404, String::new()).await.is_err());
    }

    #[tokio::test]
    async fn recent_honours_the_limit() {
        let log = SqlTransactionLog::new(setup_pool().await);
        for _ in 0..3 {
            log.append(TransactionLogEntry::new(modules::MO_CONFIRM, "[]")).await.expect("append");
        }
        assert_eq!(log.recent(2).await.expect("recent").len(), 2);
    }
}
