use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};

use wms_core::domain::confirmation::MoConfirmation;
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
    "mo_number",
    "mo_line_number",
    "pick_slip_number",
    "item_id",
    "uom_code",
    "required_quantity",
    "picked_quantity",
    "transfer_quantity",
    "source_sub_inventory",
    "destination_sub_inventory",
    "source_location_id",
    "destination_location_id",
    "person_id",
    "status",
    "error_message",
];

const TRAILING_COLUMNS: &[&str] = &[
    "org_id",
    "org_code",
    "item_code",
    "order_number",
    "delivery_detail_id",
    "customer_name",
    "customer_account_id",
];

pub struct SqlMoConfirmationRepository {
    pool: DbPool,
}

impl SqlMoConfirmationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn insert_batch(
        &self,
        records: Vec<MoConfirmation>,
    ) -> Result<Vec<MoConfirmation>, RepositoryError> {
        let statement = insert_statement(
            "mo_confirmation",
            "moid",
            &[LEADING_COLUMNS, ATTRIBUTE_COLUMNS, AUDIT_COLUMNS, TRAILING_COLUMNS],
        );

        let mut tx = self.pool.begin().await?;
        let mut committed = Vec::with_capacity(records.len());
        for mut record in records {
            let query = sqlx::query(&statement)
                .bind(record.transaction_type.clone())
                .bind(record.mo_number)
                .bind(record.mo_line_number)
                .bind(record.pick_slip_number)
                .bind(record.item_id)
                .bind(record.uom_code.clone())
                .bind(decimal_text(record.required_quantity))
                .bind(decimal_text(record.picked_quantity))
                .bind(decimal_text(record.transfer_quantity))
                .bind(record.source_sub_inventory.clone())
                .bind(record.destination_sub_inventory.clone())
                .bind(record.source_location_id)
                .bind(record.destination_location_id)
                .bind(record.person_id)
                .bind(record.status.clone())
                .bind(record.error_message.clone());
            let query = bind_audit(bind_attributes(query, &record.attributes), &record.audit)
                .bind(record.org_id)
                .bind(record.org_code.clone())
                .bind(record.item_code.clone())
                .bind(record.order_number)
                .bind(record.delivery_detail_id)
                .bind(record.customer_name.clone())
                .bind(record.customer_account_id);

            let row = query.fetch_one(&mut *tx).await?;
            record.moid = Some(row.try_get("moid")?);
            committed.push(record);
        }
        tx.commit().await?;

        Ok(committed)
    }

    async fn fetch_all(&self) -> Result<Vec<MoConfirmation>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM mo_confirmation ORDER BY moid")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(mo_confirmation_from_row).collect()
    }
}

#[async_trait]
impl ConfirmationStore<MoConfirmation> for SqlMoConfirmationRepository {
    async fn count_matching(&self, key: &CompositeKey) -> Result<i64, StoreError> {
        Ok(count_matching(&self.pool, key).await?)
    }

    async fn commit_all(
        &self,
        records: Vec<MoConfirmation>,
    ) -> Result<Vec<MoConfirmation>, StoreError> {
        Ok(self.insert_batch(records).await?)
    }

    async fn list_all(&self) -> Result<Vec<MoConfirmation>, StoreError> {
        Ok(self.fetch_all().await?)
    }
}

fn mo_confirmation_from_row(row: &SqliteRow) -> Result<MoConfirmation, RepositoryError> {
    Ok(MoConfirmation {
        moid: row.try_get("moid")?,
        transaction_type: row.try_get("transaction_type")?,
        mo_number: row.try_get("mo_number")?,
        mo_line_number: row.try_get("mo_line_number")?,
        pick_slip_number: row.try_get("pick_slip_number")?,
        item_id: row.try_get("item_id")?,
        uom_code: row.try_get("uom_code")?,
        required_quantity: parse_optional_decimal(row, "required_quantity")?,
        picked_quantity: parse_optional_decimal(row, "picked_quantity")?,
        transfer_quantity: parse_optional_decimal(row, "transfer_quantity")?,
        source_sub_inventory: row.try_get("source_sub_inventory")?,
        destination_sub_inventory: row.try_get("destination_sub_inventory")?,
        source_location_id: row.try_get("source_location_id")?,
        destination_location_id: row.try_get("destination_location_id")?,
        person_id: row.try_get("person_id")?,
        status: row.try_get("status")?,
        error_message: row.try_get("error_message")?,
        attributes: attributes_from_row(row)?,
        audit: audit_from_row(row)?,
        org_id: row.try_get("org_id")?,
        org_code: row.try_get("org_code")?,
        item_code: row.try_get("item_code")?,
        order_number: row.try_get("order_number")?,
        delivery_detail_id: row.try_get("delivery_detail_id")?,
        customer_name: row.try_get("customer_name")?,
        customer_account_id: row.try_get("customer_account_id")?,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use wms_core::domain::confirmation::MoConfirmation;
    use wms_core::ingest::keys::mo_key;
    use wms_core::ingest::ConfirmationStore;

    use super::SqlMoConfirmationRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup_pool() -> crate::DbPool {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 30).await.expect("pool should connect");
        migrations::run_pending(&pool).await.expect("migrations should run");
        pool
    }

    fn order(line: i64) -> MoConfirmation {
        let mut record = MoConfirmation {
            moid: Some(999),
            transaction_type: Some("Move Order".to_string()),
            mo_number: Some(9001),
            mo_line_number: Some(line),
            item_id: Some(880),
            source_location_id: Some(12),
            delivery_detail_id: Some(5000 + line),
            picked_quantity: Some(Decimal::new(25, 1)),
            status: Some("PICKED".to_string()),
            customer_name: Some("ACME".to_string()),
            ..MoConfirmation::default()
        };
        record.attributes.attribute12 = Some("Y".to_string());
        record
    }

    #[tokio::test]
    async fn commit_assigns_identifiers_and_round_trips_columns() {
        let repo = SqlMoConfirmationRepository::new(setup_pool().await);

        let committed = repo.commit_all(vec![order(1), order(2)]).await.expect("commit");
        assert_eq!(committed.len(), 2);
        let first_id = committed[0].moid.expect("assigned id");
        assert_ne!(first_id, 999, "client supplied identifiers are not trusted");
        assert!(committed[1].moid.expect("assigned id") > first_id);

        let listed = repo.list_all().await.expect("list");
        assert_eq!(listed, committed);
        assert_eq!(listed[0].picked_quantity, Some(Decimal::new(25, 1)));
        assert_eq!(listed[0].attributes.attribute12.as_deref(), Some("Y"));
    }

    #[tokio::test]
    async fn count_matching_follows_rendered_key_including_missing_values() {
        let repo = SqlMoConfirmationRepository::new(setup_pool().await);
        let mut without_status = order(1);
        without_status.status = None;
        repo.commit_all(vec![without_status.clone()]).await.expect("commit");

        assert_eq!(repo.count_matching(&mo_key(&without_status)).await.expect("count"), 1);
        assert_eq!(repo.count_matching(&mo_key(&order(1))).await.expect("count"), 0);
        assert_eq!(repo.count_matching(&mo_key(&order(2))).await.expect("count"), 0);
    }

    #[tokio::test]
    async fn failed_batch_leaves_no_rows_behind() {
        let pool = setup_pool().await;
        let repo = SqlMoConfirmationRepository::new(pool.clone());
        sqlx::query(
            "CREATE TRIGGER reject_line_two BEFORE INSERT ON mo_confirmation
             WHEN NEW.mo_line_number = 2
             BEGIN SELECT RAISE(ABORT, 'line two rejected'); END",
        )
        .execute(&pool)
        .await
        .expect("create trigger");

        let result = repo.commit_all(vec![order(1), order(2)]).await;
        assert!(result.is_err());
        assert!(repo.list_all().await.expect("list").is_empty());
    }
}
