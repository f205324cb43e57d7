use crate::{auth::TokenError, db::dao::DaoLayerError};

/// Boundary-level classification handed to whatever transport sits on top.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized(String),
    Conflict(String),
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(message)
            | Self::Unauthorized(message)
            | Self::Conflict(message)
            | Self::Internal(message) => message.as_str(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AppError {}

impl From<DaoLayerError> for AppError {
    fn from(err: DaoLayerError) -> Self {
        tracing::error!(error = %err, "storage failure");
        AppError::internal("database operation failed. Please check the logs for more details")
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::NotExpired => AppError::bad_request(err.to_string()),
            TokenError::Persistence(inner) => inner.into(),
            TokenError::Signing(_) => {
                tracing::error!(error = %err, "token signing failure");
                AppError::internal("Token issue failed")
            }
            TokenError::InvalidToken(_)
            | TokenError::TokenNotFound
            | TokenError::TokenExpired
            | TokenError::TokenAlreadyUsed
            | TokenError::TokenRevoked
            | TokenError::TokenMismatch
            | TokenError::UnknownUser(_) => AppError::unauthorized(err.to_string()),
        }
    }
}
