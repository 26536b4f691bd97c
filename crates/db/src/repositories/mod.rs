use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite};
use thiserror::Error;

use wms_core::domain::confirmation::{Attributes, RecordAudit};
use wms_core::errors::StoreError;
use wms_core::ingest::CompositeKey;

use crate::DbPool;

pub mod memory;
pub mod mo_confirmation;
pub mod pick_confirmation;
pub mod rma_confirmation;
pub mod transaction_log;

pub use memory::{InMemoryConfirmationRepository, InMemoryPickRepository};
pub use mo_confirmation::SqlMoConfirmationRepository;
pub use pick_confirmation::SqlPickConfirmationRepository;
pub use rma_confirmation::SqlRmaConfirmationRepository;
pub use transaction_log::SqlTransactionLog;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(source) => StoreError::Database(source.to_string()),
            RepositoryError::Decode(message) => StoreError::Decode(message),
        }
    }
}

type BoundQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

pub(crate) const ATTRIBUTE_COLUMNS: &[&str] = &[
    "attribute_category",
    "attribute1",
    "attribute2",
    "attribute3",
    "attribute4",
    "attribute5",
    "attribute6",
    "attribute7",
    "attribute8",
    "attribute9",
    "attribute10",
    "attribute11",
    "attribute12",
    "attribute13",
    "attribute14",
    "attribute15",
];

pub(crate) const AUDIT_COLUMNS: &[&str] =
    &["last_update_date", "last_updated_by", "creation_date", "created_by", "last_update_login"];

/// `INSERT ... RETURNING <id_column>` over the given column groups, in order.
pub(crate) fn insert_statement(table: &str, id_column: &str, groups: &[&[&str]]) -> String {
    let columns: Vec<&str> = groups.iter().flat_map(|group| group.iter().copied()).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders}) RETURNING {id_column}",
        columns.join(", ")
    )
}

/// Counts rows of the key's table whose key columns, compared as text with
/// NULL read as the empty string, equal the rendered key values.
pub(crate) async fn count_matching(
    pool: &DbPool,
    key: &CompositeKey,
) -> Result<i64, RepositoryError> {
    let predicates: Vec<String> = key
        .fields()
        .map(|(column, _)| format!("COALESCE(CAST({column} AS TEXT), '') = ?"))
        .collect();
    let statement = format!(
        "SELECT COUNT(*) AS count FROM {} WHERE {}",
        key.variant().table(),
        predicates.join(" AND ")
    );

    let mut query = sqlx::query(&statement);
    for (_, value) in key.fields() {
        query = query.bind(value.to_string());
    }
    let row = query.fetch_one(pool).await?;
    Ok(row.try_get("count")?)
}

pub(crate) fn bind_attributes<'q>(query: BoundQuery<'q>, attributes: &Attributes) -> BoundQuery<'q> {
    let mut query = query.bind(attributes.attribute_category.clone());
    for slot in attributes.slots() {
        query = query.bind(slot.map(str::to_string));
    }
    query
}

pub(crate) fn bind_audit<'q>(query: BoundQuery<'q>, audit: &RecordAudit) -> BoundQuery<'q> {
    query
        .bind(audit.last_update_date.map(|value| value.to_rfc3339()))
        .bind(audit.last_updated_by)
        .bind(audit.creation_date.map(|value| value.to_rfc3339()))
        .bind(audit.created_by)
        .bind(audit.last_update_login)
}

pub(crate) fn decimal_text(value: Option<Decimal>) -> Option<String> {
    value.map(|value| value.to_string())
}

pub(crate) fn attributes_from_row(row: &SqliteRow) -> Result<Attributes, RepositoryError> {
    Ok(Attributes {
        attribute_category: row.try_get("attribute_category")?,
        attribute1: row.try_get("attribute1")?,
        attribute2: row.try_get("attribute2")?,
        attribute3: row.try_get("attribute3")?,
        attribute4: row.try_get("attribute4")?,
        attribute5: row.try_get("attribute5")?,
        attribute6: row.try_get("attribute6")?,
        attribute7: row.try_get("attribute7")?,
        attribute8: row.try_get("attribute8")?,
        attribute9: row.try_get("attribute9")?,
        attribute10: row.try_get("attribute10")?,
        attribute11: row.try_get("attribute11")?,
        attribute12: row.try_get("attribute12")?,
        attribute13: row.try_get("attribute13")?,
        attribute14: row.try_get("attribute14")?,
        attribute15: row.try_get("attribute15")?,
    })
}

pub(crate) fn audit_from_row(row: &SqliteRow) -> Result<RecordAudit, RepositoryError> {
    Ok(RecordAudit {
        last_update_date: parse_optional_timestamp(
            "last_update_date",
            row.try_get("last_update_date")?,
        )?,
        last_updated_by: row.try_get("last_updated_by")?,
        creation_date: parse_optional_timestamp("creation_date", row.try_get("creation_date")?)?,
        created_by: row.try_get("created_by")?,
        last_update_login: row.try_get("last_update_login")?,
    })
}

pub(crate) fn parse_optional_decimal(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<Decimal>, RepositoryError> {
    let value: Option<String> = row.try_get(column)?;
    value
        .map(|value| {
            Decimal::from_str(&value).map_err(|error| {
                RepositoryError::Decode(format!("invalid decimal in `{column}`: {error}"))
            })
        })
        .transpose()
}

pub(crate) fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|value| value.with_timezone(&Utc)).map_err(|error| {
        RepositoryError::Decode(format!("invalid timestamp in `{column}`: {error}"))
    })
}

pub(crate) fn parse_optional_timestamp(
    column: &str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    value.map(|value| parse_timestamp(column, value)).transpose()
}

#[cfg(test)]
mod tests {
    use wms_core::errors::StoreError;

    use super::{insert_statement, parse_timestamp, RepositoryError};

    #[test]
    fn insert_statement_lists_every_group_in_order() {
        let statement = insert_statement("pick_confirmation", "serial_id", &[&["a", "b"], &["c"]]);
        assert_eq!(
            statement,
            "INSERT INTO pick_confirmation (a, b, c) VALUES (?, ?, ?) RETURNING serial_id"
        );
    }

    #[test]
    fn decode_failures_keep_their_message_across_the_store_boundary() {
        let error = parse_timestamp("creation_date", "yesterday".to_string())
            .expect_err("not rfc3339");
        let store_error = StoreError::from(error);

        assert!(matches!(store_error, StoreError::Decode(message) if message.contains("creation_date")));
    }

    #[test]
    fn database_failures_map_to_store_database_errors() {
        let error = RepositoryError::Database(sqlx::Error::RowNotFound);
        assert!(matches!(StoreError::from(error), StoreError::Database(_)));
    }
}
