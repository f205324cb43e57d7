use std::sync::Arc;

use chrono::Utc;

use crate::{
    auth::{AccessClaims, IdentityStore, TokenLifecycle, TokenPair, password::hash_password},
    error::AppError,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Transport-neutral entry points an endpoint layer maps its requests onto.
#[derive(Clone)]
pub struct AuthService {
    identities: Arc<dyn IdentityStore>,
    lifecycle: TokenLifecycle,
}

impl AuthService {
    pub fn new(identities: Arc<dyn IdentityStore>, lifecycle: TokenLifecycle) -> Self {
        Self {
            identities,
            lifecycle,
        }
    }

    pub fn lifecycle(&self) -> &TokenLifecycle {
        &self.lifecycle
    }

    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<TokenPair, AppError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AppError::bad_request("Email required"));
        }
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::bad_request("Username required"));
        }

        if self.identities.find_user_by_email(email).await?.is_some() {
            return Err(AppError::conflict("User already exists"));
        }

        let password_hash = hash_password(password)?;
        let user = self
            .identities
            .create_user(email, username, &password_hash)
            .await?;
        tracing::info!(user_id = %user.id, "registered user");

        Ok(self.lifecycle.issue_for_user(&user).await?)
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AppError> {
        let user = self
            .identities
            .find_user_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;

        if !self.identities.verify_password(&user, password).await? {
            tracing::debug!(user_id = %user.id, "login refused: wrong password");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        self.identities.record_login(&user, Utc::now()).await?;
        Ok(self.lifecycle.issue_for_user(&user).await?)
    }

    pub async fn refresh(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<TokenPair, AppError> {
        Ok(self.lifecycle.rotate(access_token, refresh_token).await?)
    }

    pub fn authenticate(&self, access_token: &str) -> Result<AccessClaims, AppError> {
        Ok(self.lifecycle.authenticate(access_token)?)
    }
}
