use dropshop_core::config::{AppConfig, ConfigError, LoadOptions};
use dropshop_db::{connect_with_config, migrations, DbPool};
use dropshop_suppliers::{SupplierError, SupplierRegistry};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub suppliers: SupplierRegistry,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("supplier clients could not be built: {0}")]
    Suppliers(#[source] SupplierError),
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

    let suppliers =
        SupplierRegistry::from_config(&config.suppliers).map_err(BootstrapError::Suppliers)?;
    info!(
        event_name = "system.bootstrap.suppliers_ready",
        correlation_id = "bootstrap",
        configured = ?suppliers.configured(),
        "supplier clients initialized"
    );

    Ok(Application { config, db_pool, suppliers })
}
