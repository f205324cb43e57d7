use std::time::Duration;

use sea_orm::DatabaseConnection;

use super::{DEFAULT_OPERATION_TIMEOUT, DaoBase, RefreshTokenDao, UserDao};

#[derive(Clone)]
pub struct DaoContext {
    db: DatabaseConnection,
    timeout: Duration,
}

impl DaoContext {
    pub fn new(db: &DatabaseConnection, timeout: Duration) -> Self {
        Self {
            db: db.clone(),
            timeout,
        }
    }

    pub fn with_default_timeout(db: &DatabaseConnection) -> Self {
        Self::new(db, DEFAULT_OPERATION_TIMEOUT)
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn user(&self) -> UserDao {
        DaoBase::from_db(self.db.clone(), self.timeout)
    }

    pub fn refresh_token(&self) -> RefreshTokenDao {
        DaoBase::from_db(self.db.clone(), self.timeout)
    }
}
