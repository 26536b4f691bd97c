use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};
use tracing::debug;

use wms_core::config::DEFAULT_LOCATION_SQL;
use wms_core::errors::StoreError;
use wms_core::ingest::LocationProcedure;

use crate::repositories::RepositoryError;
use crate::DbPool;

/// Locator check expressed as a configurable SQL statement taking the
/// subinventory (`?1`) and locator code (`?2`). The first column of the first
/// row is handed back as text.
pub struct SqlLocationProcedure {
    pool: DbPool,
    statement: String,
}

impl SqlLocationProcedure {
    pub fn new(pool: DbPool, statement: impl Into<String>) -> Self {
        Self { pool, statement: statement.into() }
    }

    pub fn with_default_statement(pool: DbPool) -> Self {
        Self::new(pool, DEFAULT_LOCATION_SQL)
    }

    async fn first_row(
        &self,
        subinventory: &str,
        locator: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query(&self.statement)
            .bind(subinventory)
            .bind(locator)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(first_column_text).transpose().map(Option::flatten)
    }
}

#[async_trait]
impl LocationProcedure for SqlLocationProcedure {
    async fn check(
        &self,
        subinventory: &str,
        locator: &str,
    ) -> Result<Option<String>, StoreError> {
        let result = self.first_row(subinventory, locator).await;
        debug!(
            event_name = "location.procedure.called",
            correlation_id = locator,
            subinventory,
            found = matches!(result, Ok(Some(_))),
            "location procedure evaluated"
        );
        result.map_err(|error| StoreError::Procedure(error.to_string()))
    }
}

fn first_column_text(row: &SqliteRow) -> Result<Option<String>, RepositoryError> {
    if let Ok(text) = row.try_get::<Option<String>, _>(0) {
        return Ok(text);
    }
    if let Ok(number) = row.try_get::<Option<i64>, _>(0) {
        return Ok(number.map(|number| number.to_string()));
    }
    let real: Option<f64> = row.try_get(0)?;
    Ok(real.map(|real| real.to_string()))
}
