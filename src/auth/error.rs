use jsonwebtoken::Algorithm;
use uuid::Uuid;

use crate::db::dao::DaoLayerError;

/// Why an access token string could not be turned into trusted claims.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("signature verification failed")]
    BadSignature,
    #[error("unexpected signing algorithm {found:?} (expected {expected:?})")]
    AlgorithmMismatch {
        expected: Algorithm,
        found: Algorithm,
    },
    #[error("token has expired")]
    Expired,
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid access token: {0}")]
    InvalidToken(#[source] CodecError),
    #[error("access token has not expired yet")]
    NotExpired,
    #[error("refresh token does not exist")]
    TokenNotFound,
    #[error("refresh token has expired")]
    TokenExpired,
    #[error("refresh token has already been used")]
    TokenAlreadyUsed,
    #[error("refresh token has been revoked")]
    TokenRevoked,
    #[error("refresh token was not issued with this access token")]
    TokenMismatch,
    #[error("user {0} no longer exists")]
    UnknownUser(Uuid),
    #[error("access token signing failed: {0}")]
    Signing(#[source] CodecError),
    #[error("token store failure: {0}")]
    Persistence(#[from] DaoLayerError),
}
