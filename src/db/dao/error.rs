use std::time::Duration;

use sea_orm::DbErr;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum DaoLayerError {
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
    #[error("{entity} not found (id={id})")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },
    #[error("{entity} {id} is unusable: {reason}")]
    Corrupt {
        entity: &'static str,
        id: Uuid,
        reason: String,
    },
}

pub type DaoResult<T> = Result<T, DaoLayerError>;
