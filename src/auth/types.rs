use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::entities::{refresh_token, user};

/// The only view of a user the token layer needs.
pub trait AuthSubject: Send + Sync {
    fn id(&self) -> Uuid;
    fn email(&self) -> &str;
    fn username(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: Uuid,
    pub email: String,
    pub username: String,
}

impl AuthSubject for UserIdentity {
    fn id(&self) -> Uuid {
        self.id
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn username(&self) -> &str {
        &self.username
    }
}

impl From<&user::Model> for UserIdentity {
    fn from(model: &user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email.clone(),
            username: model.username.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    #[serde(rename = "id")]
    pub user_id: Uuid,
    pub email: String,
    pub sub: String, // username
    pub jti: String,
    pub iat: i64,
    pub exp: i64, // unix seconds
}

impl AccessClaims {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshTokenState {
    Active,
    Used,
    Revoked,
    Expired,
}

/// Administrative view of a stored refresh token; never carries the token string.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub jwt_id: String,
    pub issued_at: DateTime<FixedOffset>,
    pub expires_at: DateTime<FixedOffset>,
    pub state: RefreshTokenState,
}

impl SessionSummary {
    pub fn from_model(model: &refresh_token::Model, now: DateTime<Utc>) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            jwt_id: model.jwt_id.clone(),
            issued_at: model.issued_at,
            expires_at: model.expires_at,
            state: model.state(now),
        }
    }
}
