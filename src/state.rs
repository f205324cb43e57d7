use std::sync::Arc;

use anyhow::Context;
use sea_orm::DatabaseConnection;

use crate::{
    auth::{JwtKeys, TokenLifecycle, TokenSettings},
    config::{AppConfig, TokenConfig},
    db::{self, dao::DaoContext},
    services::AuthService,
};

/// Everything a caller needs to serve auth requests against one database.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub lifecycle: TokenLifecycle,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(tokens: &TokenConfig, db: DatabaseConnection) -> anyhow::Result<Arc<Self>> {
        let daos = DaoContext::new(&db, tokens.store_timeout());
        let identities = Arc::new(daos.user());
        let lifecycle = TokenLifecycle::new(
            JwtKeys::from_secret(tokens.jwt_secret.as_bytes()),
            TokenSettings::from_config(tokens)?,
            Arc::new(daos.refresh_token()),
            identities.clone(),
        );
        let auth = AuthService::new(identities, lifecycle.clone());

        Ok(Arc::new(Self {
            db,
            lifecycle,
            auth,
        }))
    }

    /// Connects using `cfg.database` and syncs the schema before handing the state out.
    pub async fn connect(cfg: &AppConfig) -> anyhow::Result<Arc<Self>> {
        let database = cfg
            .database
            .as_ref()
            .context("database configuration is required (APP_DATABASE__URL)")?;
        let tokens = cfg
            .tokens
            .as_ref()
            .context("token configuration is required (APP_TOKENS__JWT_SECRET)")?;

        let db = db::connect(database).await?;
        Self::new(tokens, db)
    }
}
