use anyhow::Context;
use sea_orm::DatabaseConnection;
use tracing::info;

use super::providers::default_registry;
use crate::config::DatabaseConfig;

/// Opens a pool for `cfg.url` and brings the schema in line with the entities.
pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let provider = default_registry()?.provider_for_url(&cfg.url)?;
    info!(provider = %provider.id(), "connecting to database");

    let db = provider.connect(cfg).await?;
    provider
        .post_connect(&db, cfg)
        .await
        .context("database post-connect setup failed")?;
    sync_schema(&db).await?;
    Ok(db)
}

pub async fn sync_schema(db: &DatabaseConnection) -> anyhow::Result<()> {
    info!("syncing database schema from entities");
    db.get_schema_registry("token_lifecycle::db::entities::*")
        .sync(db)
        .await
        .context("schema sync failed")?;
    Ok(())
}
