use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};

use wms_core::domain::confirmation::RmaConfirmation;
use wms_core::errors::StoreError;
use wms_core::ingest::{CompositeKey, ConfirmationStore};

use super::{
    attributes_from_row, audit_from_row, bind_attributes, bind_audit, count_matching,
    decimal_text, insert_statement, parse_optional_decimal, RepositoryError, ATTRIBUTE_COLUMNS,
    AUDIT_COLUMNS,
};
use crate::DbPool;

const LEADING_COLUMNS: &[&str] = &[
    "transaction_type",
    "party_id",
    "cust_account_id",
    "bill_to_sites_use_id",
    "ship_to_sites_use_id",
    "inventory_org_id",
    "line_number",
    "item_id",
    "uom_code",
    "order_quantity",
    "receipt_number",
    "return_quantity",
    "delivered_quantity",
    "received_quantity",
    "item_condition",
    "suggested_subinventory",
    "delivered_subinventory",
    "suggested_locator_id",
    "delivered_locator_id",
    "person_id",
    "status",
    "error_message",
];

const TRAILING_COLUMNS: &[&str] = &[
    "org_id",
    "org_code",
    "order_header_id",
    "order_line_id",
    "parent_transaction_id",
    "primary_unit_of_measurement",
];

pub struct SqlRmaConfirmationRepository {
    pool: DbPool,
}

impl SqlRmaConfirmationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn insert_batch(
        &self,
        records: Vec<RmaConfirmation>,
    ) -> Result<Vec<RmaConfirmation>, RepositoryError> {
        let statement = insert_statement(
            "rma_confirmation",
            "rma_id",
            &[LEADING_COLUMNS, ATTRIBUTE_COLUMNS, AUDIT_COLUMNS, TRAILING_COLUMNS],
        );

        let mut tx = self.pool.begin().await?;
        let mut committed = Vec::with_capacity(records.len());
        for mut record in records {
            let query = sqlx::query(&statement)
                .bind(record.transaction_type.clone())
                .bind(record.party_id)
                .bind(record.cust_account_id)
                .bind(record.bill_to_sites_use_id)
                .bind(record.ship_to_sites_use_id)
                .bind(record.inventory_org_id)
                .bind(record.line_number)
                .bind(record.item_id)
                .bind(record.uom_code.clone())
                .bind(decimal_text(record.order_quantity))
                .bind(record.receipt_number.clone())
                .bind(decimal_text(record.return_quantity))
                .bind(decimal_text(record.delivered_quantity))
                .bind(decimal_text(record.received_quantity))
                .bind(record.item_condition.clone())
                .bind(record.suggested_subinventory.clone())
                .bind(record.delivered_subinventory.clone())
                .bind(record.suggested_locator_id)
                .bind(record.delivered_locator_id)
                .bind(record.person_id)
                .bind(record.status.clone())
                .bind(record.error_message.clone());
            let query = bind_audit(bind_attributes(query, &record.attributes), &record.audit)
                .bind(record.org_id)
                .bind(record.org_code.clone())
                .bind(record.order_header_id)
                .bind(record.order_line_id)
                .bind(record.parent_transaction_id)
                .bind(record.primary_unit_of_measurement.clone());

            let row = query.fetch_one(&mut *tx).await?;
            record.rma_id = Some(row.try_get("rma_id")?);
            committed.push(record);
        }
        tx.commit().await?;

        Ok(committed)
    }

    async fn fetch_all(&self) -> Result<Vec<RmaConfirmation>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM rma_confirmation ORDER BY rma_id DESC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(rma_confirmation_from_row).collect()
    }
}

#[async_trait]
impl ConfirmationStore<RmaConfirmation> for SqlRmaConfirmationRepository {
    async fn count_matching(&self, key: &CompositeKey) -> Result<i64, StoreError> {
        Ok(count_matching(&self.pool, key).await?)
    }

    async fn commit_all(
        &self,
        records: Vec<RmaConfirmation>,
    ) -> Result<Vec<RmaConfirmation>, StoreError> {
        Ok(self.insert_batch(records).await?)
    }

    /// Newest first.
    async fn list_all(&self) -> Result<Vec<RmaConfirmation>, StoreError> {
        Ok(self.fetch_all().await?)
    }
}

fn rma_confirmation_from_row(row: &SqliteRow) -> Result<RmaConfirmation, RepositoryError> {
    Ok(RmaConfirmation {
        rma_id: row.try_get("rma_id")?,
        transaction_type: row.try_get("transaction_type")?,
        party_id: row.try_get("party_id")?,
        cust_account_id: row.try_get("cust_account_id")?,
        bill_to_sites_use_id: row.try_get("bill_to_sites_use_id")?,
        ship_to_sites_use_id: row.try_get("ship_to_sites_use_id")?,
        inventory_org_id: row.try_get("inventory_org_id")?,
        line_number: row.try_get("line_number")?,
        item_id: row.try_get("item_id")?,
        uom_code: row.try_get("uom_code")?,
        order_quantity: parse_optional_decimal(row, "order_quantity")?,
        receipt_number: row.try_get("receipt_number")?,
        return_quantity: parse_optional_decimal(row, "return_quantity")?,
        delivered_quantity: parse_optional_decimal(row, "delivered_quantity")?,
        received_quantity: parse_optional_decimal(row, "received_quantity")?,
        item_condition: row.try_get("item_condition")?,
        suggested_subinventory: row.try_get("suggested_subinventory")?,
        delivered_subinventory: row.try_get("delivered_subinventory")?,
        suggested_locator_id: row.try_get("suggested_locator_id")?,
        delivered_locator_id: row.try_get("delivered_locator_id")?,
        person_id: row.try_get("person_id")?,
        status: row.try_get("status")?,
        error_message: row.try_get("error_message")?,
        attributes: attributes_from_row(row)?,
        audit: audit_from_row(row)?,
        org_id: row.try_get("org_id")?,
        org_code: row.try_get("org_code")?,
        order_header_id: row.try_get("order_header_id")?,
        order_line_id: row.try_get("order_line_id")?,
        parent_transaction_id: row.try_get("parent_transaction_id")?,
        primary_unit_of_measurement: row.try_get("primary_unit_of_measurement")?,
    })
}
