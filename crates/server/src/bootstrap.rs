use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use wms_core::config::{AppConfig, ConfigError, LoadOptions};
use wms_core::ingest::{ConfirmationService, IngestionPorts};
use wms_db::{
    connect_with_config, migrations, DbPool, SqlLocationProcedure, SqlMoConfirmationRepository,
    SqlPickConfirmationRepository, SqlRmaConfirmationRepository, SqlTransactionLog,
};

use crate::quick_pick::HttpQuickPickProcedure;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub service: ConfirmationService,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("quick-pick client setup failed: {0}")]
    QuickPickClient(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let quick_pick = HttpQuickPickProcedure::from_config(&config.procedures)
        .map_err(BootstrapError::QuickPickClient)?;
    if !quick_pick.is_configured() {
        info!(
            event_name = "system.bootstrap.quick_pick_unconfigured",
            correlation_id = "bootstrap",
            "no quick-pick endpoint configured; quick-pick calls will fail"
        );
    }

    let ports = IngestionPorts {
        mo: Arc::new(SqlMoConfirmationRepository::new(db_pool.clone())),
        picks: Arc::new(SqlPickConfirmationRepository::new(db_pool.clone())),
        rma: Arc::new(SqlRmaConfirmationRepository::new(db_pool.clone())),
        log: Arc::new(SqlTransactionLog::new(db_pool.clone())),
        location: Arc::new(SqlLocationProcedure::new(
            db_pool.clone(),
            config.procedures.location_sql.clone(),
        )),
        quick_pick: Arc::new(quick_pick),
    };
    let service = ConfirmationService::new(ports, config.ingestion.settings());

    Ok(Application { config, db_pool, service })
}

#[cfg(test)]
mod tests {
    use wms_core::config::{ConfigOverrides, LoadOptions};
    use wms_core::domain::confirmation::MoConfirmation;

    use crate::bootstrap::bootstrap;

    fn overrides(database_url: &str) -> ConfigOverrides {
        ConfigOverrides { database_url: Some(database_url.to_string()), ..ConfigOverrides::default() }
    }

    #[tokio::test]
    async fn bootstrap_migrates_and_wires_the_ingestion_service() {
        let app = bootstrap(LoadOptions {
            overrides: overrides("sqlite::memory:?cache=shared"),
            ..LoadOptions::default()
        })
        .await
        .expect("bootstrap should succeed with an in-memory database");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('mo_confirmation', 'pick_confirmation', 'rma_confirmation', 'mob_trans_log')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("confirmation tables should exist after bootstrap");
        assert_eq!(table_count, 4);

        let response = app
            .service
            .insert_mo(vec![MoConfirmation { mo_number: Some(1), ..MoConfirmation::default() }])
            .await;
        assert_eq!(response.status, 200);

        let quick_pick = app.service.quick_pick(serde_json::json!({})).await;
        assert_eq!(quick_pick.status, 500, "no quick-pick endpoint is configured");

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_rejects_non_http_quick_pick_endpoint() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                quick_pick_url: Some("ftp://erp.local/quick-pick".to_string()),
                ..overrides("sqlite::memory:")
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("validation should fail").to_string();
        assert!(message.contains("quick_pick_url"));
    }
}
