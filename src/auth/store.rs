use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::UserIdentity;
use crate::db::{dao::DaoResult, entities::refresh_token};

/// A refresh token row that has been minted but not yet persisted.
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub token: String,
    pub jwt_id: String,
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl NewRefreshToken {
    pub fn into_model(self, id: Uuid) -> refresh_token::Model {
        refresh_token::Model {
            id,
            token: self.token,
            jwt_id: self.jwt_id,
            user_id: self.user_id,
            issued_at: self.issued_at.fixed_offset(),
            updated_at: self.issued_at.fixed_offset(),
            expires_at: self.expires_at.fixed_offset(),
            is_used: false,
            is_revoked: false,
        }
    }
}

/// Outcome of the atomic mark-used-and-replace step of a rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redemption {
    Redeemed(refresh_token::Model),
    AlreadyUsed,
    Revoked,
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn insert(&self, token: NewRefreshToken) -> DaoResult<refresh_token::Model>;

    async fn find_by_token(&self, token: &str) -> DaoResult<Option<refresh_token::Model>>;

    async fn find_by_id(&self, id: Uuid) -> DaoResult<Option<refresh_token::Model>>;

    /// Newest first.
    async fn find_by_user_id(&self, user_id: Uuid) -> DaoResult<Vec<refresh_token::Model>>;

    /// Returns `true` only for the call that flipped the flag; marking a used row again is a no-op.
    async fn mark_used(&self, id: Uuid) -> DaoResult<bool>;

    /// Marks `id` used and stores `replacement` as one unit. The mark only applies while the row
    /// is neither used nor revoked, so of several concurrent redemptions at most one succeeds.
    async fn redeem(&self, id: Uuid, replacement: NewRefreshToken) -> DaoResult<Redemption>;

    async fn revoke(&self, id: Uuid) -> DaoResult<bool>;

    async fn revoke_all_for_user(&self, user_id: Uuid) -> DaoResult<u64>;
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> DaoResult<Option<UserIdentity>>;

    async fn find_user_by_id(&self, id: Uuid) -> DaoResult<Option<UserIdentity>>;

    async fn verify_password(&self, user: &UserIdentity, password: &str) -> DaoResult<bool>;

    async fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> DaoResult<UserIdentity>;

    async fn record_login(&self, user: &UserIdentity, at: DateTime<Utc>) -> DaoResult<()>;
}
