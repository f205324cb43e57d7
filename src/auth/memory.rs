//! In-process stores. Each instance owns its state; nothing here is process-global.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    NewRefreshToken, Redemption, RefreshTokenStore, UserIdentity,
    password::{hash_password, verify_password},
    store::IdentityStore,
};
use crate::{
    db::{dao::DaoLayerError, dao::DaoResult, entities::refresh_token},
    error::AppError,
};

const REFRESH_TOKEN_ENTITY: &str = "refresh_token";
const USER_ENTITY: &str = "user";

#[derive(Default)]
pub struct MemoryRefreshTokenStore {
    rows: Mutex<HashMap<Uuid, refresh_token::Model>>,
}

impl MemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn insert(&self, token: NewRefreshToken) -> DaoResult<refresh_token::Model> {
        let model = token.into_model(Uuid::new_v4());
        self.rows.lock().await.insert(model.id, model.clone());
        Ok(model)
    }

    async fn find_by_token(&self, token: &str) -> DaoResult<Option<refresh_token::Model>> {
        let rows = self.rows.lock().await;
        Ok(rows.values().find(|row| row.token == token).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> DaoResult<Option<refresh_token::Model>> {
        Ok(self.rows.lock().await.get(&id).cloned())
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> DaoResult<Vec<refresh_token::Model>> {
        let rows = self.rows.lock().await;
        let mut found: Vec<_> = rows
            .values()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        Ok(found)
    }

    async fn mark_used(&self, id: Uuid) -> DaoResult<bool> {
        let mut rows = self.rows.lock().await;
        let row = rows.get_mut(&id).ok_or(DaoLayerError::NotFound {
            entity: REFRESH_TOKEN_ENTITY,
            id,
        })?;
        if row.is_used {
            return Ok(false);
        }
        row.is_used = true;
        row.updated_at = Utc::now().fixed_offset();
        Ok(true)
    }

    async fn redeem(&self, id: Uuid, replacement: NewRefreshToken) -> DaoResult<Redemption> {
        let mut rows = self.rows.lock().await;
        let row = rows.get_mut(&id).ok_or(DaoLayerError::NotFound {
            entity: REFRESH_TOKEN_ENTITY,
            id,
        })?;
        if row.is_revoked {
            return Ok(Redemption::Revoked);
        }
        if row.is_used {
            return Ok(Redemption::AlreadyUsed);
        }
        row.is_used = true;
        row.updated_at = Utc::now().fixed_offset();

        let model = replacement.into_model(Uuid::new_v4());
        rows.insert(model.id, model.clone());
        Ok(Redemption::Redeemed(model))
    }

    async fn revoke(&self, id: Uuid) -> DaoResult<bool> {
        let mut rows = self.rows.lock().await;
        let row = rows.get_mut(&id).ok_or(DaoLayerError::NotFound {
            entity: REFRESH_TOKEN_ENTITY,
            id,
        })?;
        if row.is_revoked {
            return Ok(false);
        }
        row.is_revoked = true;
        row.updated_at = Utc::now().fixed_offset();
        Ok(true)
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> DaoResult<u64> {
        let now = Utc::now().fixed_offset();
        let mut rows = self.rows.lock().await;
        let mut revoked = 0;
        for row in rows
            .values_mut()
            .filter(|row| row.user_id == user_id && !row.is_revoked)
        {
            row.is_revoked = true;
            row.updated_at = now;
            revoked += 1;
        }
        Ok(revoked)
    }
}

struct StoredUser {
    identity: UserIdentity,
    password_hash: String,
    last_login_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct MemoryIdentityStore {
    users: Mutex<HashMap<Uuid, StoredUser>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes `password` and stores a new user.
    pub async fn add_user(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<UserIdentity, AppError> {
        let hash = hash_password(password)?;
        Ok(IdentityStore::create_user(self, email, username, &hash).await?)
    }

    pub async fn remove_user(&self, id: Uuid) -> bool {
        self.users.lock().await.remove(&id).is_some()
    }

    pub async fn last_login_at(&self, id: Uuid) -> Option<DateTime<Utc>> {
        self.users
            .lock()
            .await
            .get(&id)
            .and_then(|user| user.last_login_at)
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_user_by_email(&self, email: &str) -> DaoResult<Option<UserIdentity>> {
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|user| user.identity.email == email)
            .map(|user| user.identity.clone()))
    }

    async fn find_user_by_id(&self, id: Uuid) -> DaoResult<Option<UserIdentity>> {
        Ok(self
            .users
            .lock()
            .await
            .get(&id)
            .map(|user| user.identity.clone()))
    }

    async fn verify_password(&self, user: &UserIdentity, password: &str) -> DaoResult<bool> {
        let users = self.users.lock().await;
        let stored = users.get(&user.id).ok_or(DaoLayerError::NotFound {
            entity: USER_ENTITY,
            id: user.id,
        })?;
        verify_password(password, &stored.password_hash).map_err(|err| DaoLayerError::Corrupt {
            entity: USER_ENTITY,
            id: user.id,
            reason: format!("unreadable password hash: {err}"),
        })
    }

    async fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> DaoResult<UserIdentity> {
        let identity = UserIdentity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            username: username.to_string(),
        };
        self.users.lock().await.insert(
            identity.id,
            StoredUser {
                identity: identity.clone(),
                password_hash: password_hash.to_string(),
                last_login_at: None,
            },
        );
        Ok(identity)
    }

    async fn record_login(&self, user: &UserIdentity, at: DateTime<Utc>) -> DaoResult<()> {
        let mut users = self.users.lock().await;
        let stored = users.get_mut(&user.id).ok_or(DaoLayerError::NotFound {
            entity: USER_ENTITY,
            id: user.id,
        })?;
        stored.last_login_at = Some(at);
        Ok(())
    }
}
