use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};

use wms_core::domain::confirmation::PickConfirmation;
use wms_core::errors::StoreError;
use wms_core::ingest::{CompositeKey, ConfirmationStore, PickStore};

use super::{
    attributes_from_row, audit_from_row, bind_attributes, bind_audit, count_matching,
    decimal_text, insert_statement, parse_optional_decimal, RepositoryError, ATTRIBUTE_COLUMNS,
    AUDIT_COLUMNS,
};
use crate::DbPool;

const LEADING_COLUMNS: &[&str] = &[
    "delivery_detail_id",
    "from_serial_number",
    "to_serial_number",
    "quantity",
    "status",
    "transaction_type",
];

pub struct SqlPickConfirmationRepository {
    pool: DbPool,
}

impl SqlPickConfirmationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn insert_batch(
        &self,
        records: Vec<PickConfirmation>,
    ) -> Result<Vec<PickConfirmation>, RepositoryError> {
        let statement = insert_statement(
            "pick_confirmation",
            "serial_id",
            &[LEADING_COLUMNS, ATTRIBUTE_COLUMNS, AUDIT_COLUMNS],
        );

        let mut tx = self.pool.begin().await?;
        let mut committed = Vec::with_capacity(records.len());
        for mut record in records {
            let query = sqlx::query(&statement)
                .bind(record.delivery_detail_id)
                .bind(record.from_serial_number.clone())
                .bind(record.to_serial_number.clone())
                .bind(decimal_text(record.quantity))
                .bind(record.status.clone())
                .bind(record.transaction_type.clone());
            let query = bind_audit(bind_attributes(query, &record.attributes), &record.audit);

            let row = query.fetch_one(&mut *tx).await?;
            record.serial_id = Some(row.try_get("serial_id")?);
            committed.push(record);
        }
        tx.commit().await?;

        Ok(committed)
    }
}

#[async_trait]
impl ConfirmationStore<PickConfirmation> for SqlPickConfirmationRepository {
    async fn count_matching(&self, key: &CompositeKey) -> Result<i64, StoreError> {
        Ok(count_matching(&self.pool, key).await?)
    }

    async fn commit_all(
        &self,
        records: Vec<PickConfirmation>,
    ) -> Result<Vec<PickConfirmation>, StoreError> {
        Ok(self.insert_batch(records).await?)
    }

    async fn list_all(&self) -> Result<Vec<PickConfirmation>, StoreError> {
        let rows = sqlx::query("SELECT * FROM pick_confirmation ORDER BY serial_id")
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(rows.iter().map(pick_confirmation_from_row).collect::<Result<Vec<_>, _>>()?)
    }
}

#[async_trait]
impl PickStore for SqlPickConfirmationRepository {
    async fn count_for_delivery_detail(
        &self,
        delivery_detail_id: i64,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM pick_confirmation WHERE delivery_detail_id = ?",
        )
        .bind(delivery_detail_id)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from)?;
        Ok(row.try_get("count").map_err(RepositoryError::from)?)
    }
}

fn pick_confirmation_from_row(row: &SqliteRow) -> Result<PickConfirmation, RepositoryError> {
    Ok(PickConfirmation {
        serial_id: row.try_get("serial_id")?,
        delivery_detail_id: row.try_get("delivery_detail_id")?,
        from_serial_number: row.try_get("from_serial_number")?,
        to_serial_number: row.try_get("to_serial_number")?,
        quantity: parse_optional_decimal(row, "quantity")?,
        status: row.try_get("status")?,
        transaction_type: row.try_get("transaction_type")?,
        attributes: attributes_from_row(row)?,
        audit: audit_from_row(row)?,
    })
}

#[cfg(test)]
mod tests {
    use wms_core::domain::confirmation::PickConfirmation;
    use wms_core::ingest::keys::{pick_key, pick_key_as};
    use wms_core::ingest::{ConfirmationStore, KeyVariant, PickStore};

    use super::SqlPickConfirmationRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup_pool() -> crate::DbPool {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 30).await.expect("pool should connect");
        migrations::run_pending(&pool).await.expect("migrations should run");
        pool
    }

    fn pick(detail: i64, serial: &str, kind: &str) -> PickConfirmation {
        let mut record = PickConfirmation {
            delivery_detail_id: Some(detail),
            from_serial_number: Some(serial.to_string()),
            to_serial_number: Some(serial.to_string()),
            transaction_type: Some(kind.to_string()),
            ..PickConfirmation::default()
        };
        record.attributes.attribute2 = Some("LOT-9".to_string());
        record
    }

    #[tokio::test]
    async fn delivery_detail_count_spans_every_committed_batch() {
        let repo = SqlPickConfirmationRepository::new(setup_pool().await);
        repo.commit_all(vec![pick(5001, "SN-1", "out bound picking")]).await.expect("first");
        repo.commit_all(vec![
            pick(5001, "SN-2", "out bound picking"),
            pick(5002, "SN-3", "out bound picking"),
        ])
        .await
        .expect("second");

        assert_eq!(repo.count_for_delivery_detail(5001).await.expect("count"), 2);
        assert_eq!(repo.count_for_delivery_detail(5002).await.expect("count"), 1);
        assert_eq!(repo.count_for_delivery_detail(7).await.expect("count"), 0);
    }

    #[tokio::test]
    async fn duplicate_probe_is_scoped_to_the_rule_columns() {
        let repo = SqlPickConfirmationRepository::new(setup_pool().await);
        let stored = pick(5001, "SN-1", "rma_delivery");
        let committed = repo.commit_all(vec![stored.clone()]).await.expect("commit");
        assert!(committed[0].serial_id.is_some());
        assert_eq!(committed[0].to_serial_number.as_deref(), Some("SN-1"));

        let same = pick_key(&stored).expect("routable");
        assert_eq!(same.variant(), KeyVariant::PickRmaDelivery);
        assert_eq!(repo.count_matching(&same).await.expect("count"), 1);

        let other_serial = pick_key(&pick(5001, "SN-2", "rma_delivery")).expect("routable");
        assert_eq!(repo.count_matching(&other_serial).await.expect("count"), 0);

        let as_outbound = pick_key_as(KeyVariant::OutboundPick, &stored).expect("pick rule");
        assert_eq!(repo.count_matching(&as_outbound).await.expect("count"), 1);
    }
}
