use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, distributions::DistString, rngs::OsRng};
use uuid::Uuid;

use super::{
    AccessClaims, AuthSubject, NewRefreshToken, Redemption, RefreshTokenStore, SessionSummary,
    TokenPair,
    error::{CodecError, TokenError},
    jwt::{AccessTokenCodec, JwtKeys},
    store::IdentityStore,
};
use crate::config::TokenConfig;

const REFRESH_TOKEN_RANDOM_CHARS: usize = 32;
pub const TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Clone, Copy)]
pub struct TokenSettings {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenSettings {
    pub fn from_config(cfg: &TokenConfig) -> anyhow::Result<Self> {
        let access_ttl = i64::try_from(cfg.access_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .with_context(|| format!("tokens.access_ttl_secs out of range: {}", cfg.access_ttl_secs))?;
        let refresh_ttl = i64::try_from(cfg.refresh_ttl_days)
            .ok()
            .and_then(Duration::try_days)
            .with_context(|| {
                format!("tokens.refresh_ttl_days out of range: {}", cfg.refresh_ttl_days)
            })?;
        Ok(Self {
            access_ttl,
            refresh_ttl,
        })
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(180),
        }
    }
}

/// Opaque refresh token: CSPRNG alphanumerics followed by a hyphen-free UUIDv4.
fn generate_refresh_token() -> String {
    let mut token = Alphanumeric.sample_string(&mut OsRng, REFRESH_TOKEN_RANDOM_CHARS);
    token.push_str(&Uuid::new_v4().simple().to_string());
    token
}

/// Issues access/refresh pairs and rotates them. Holds no session state of its own.
#[derive(Clone)]
pub struct TokenLifecycle {
    codec: AccessTokenCodec,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    identities: Arc<dyn IdentityStore>,
    refresh_ttl: Duration,
}

impl TokenLifecycle {
    pub fn new(
        keys: JwtKeys,
        settings: TokenSettings,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        identities: Arc<dyn IdentityStore>,
    ) -> Self {
        Self {
            codec: AccessTokenCodec::new(keys, settings.access_ttl),
            refresh_tokens,
            identities,
            refresh_ttl: settings.refresh_ttl,
        }
    }

    pub fn codec(&self) -> &AccessTokenCodec {
        &self.codec
    }

    /// Mints an access token and persists its paired refresh token in one write.
    pub async fn issue_for_user(&self, subject: &dyn AuthSubject) -> Result<TokenPair, TokenError> {
        let (pair, replacement) = self.mint(subject, Utc::now())?;
        let row = self.refresh_tokens.insert(replacement).await?;

        tracing::info!(
            user_id = %subject.id(),
            refresh_token_id = %row.id,
            jti = %row.jwt_id,
            "issued token pair"
        );
        Ok(pair)
    }

    /// Exchanges an expired access token and its still-active refresh token for a new pair.
    ///
    /// Checks run in a fixed order and the first failure wins. The stored row is only
    /// consumed by the final atomic `redeem`, so every earlier failure leaves it untouched.
    pub async fn rotate(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<TokenPair, TokenError> {
        let now = Utc::now();

        let claims = self
            .codec
            .verify(access_token)
            .map_err(TokenError::InvalidToken)?;
        if !claims.is_expired_at(now) {
            tracing::debug!(user_id = %claims.user_id, jti = %claims.jti, "rotation refused: access token still valid");
            return Err(TokenError::NotExpired);
        }

        let Some(stored) = self.refresh_tokens.find_by_token(refresh_token).await? else {
            tracing::debug!(user_id = %claims.user_id, "rotation refused: unknown refresh token");
            return Err(TokenError::TokenNotFound);
        };
        if stored.is_expired_at(now) {
            tracing::debug!(refresh_token_id = %stored.id, "rotation refused: refresh token expired");
            return Err(TokenError::TokenExpired);
        }
        if stored.is_revoked {
            tracing::debug!(refresh_token_id = %stored.id, "rotation refused: refresh token revoked");
            return Err(TokenError::TokenRevoked);
        }
        if stored.is_used {
            tracing::warn!(
                refresh_token_id = %stored.id,
                user_id = %stored.user_id,
                "refresh token replayed after use"
            );
            return Err(TokenError::TokenAlreadyUsed);
        }
        if stored.jwt_id != claims.jti {
            tracing::debug!(refresh_token_id = %stored.id, jti = %claims.jti, "rotation refused: jti mismatch");
            return Err(TokenError::TokenMismatch);
        }

        let Some(user) = self.identities.find_user_by_id(stored.user_id).await? else {
            tracing::debug!(user_id = %stored.user_id, "rotation refused: owner no longer exists");
            return Err(TokenError::UnknownUser(stored.user_id));
        };

        let (pair, replacement) = self.mint(&user, now)?;
        match self.refresh_tokens.redeem(stored.id, replacement).await? {
            Redemption::Redeemed(row) => {
                tracing::info!(
                    user_id = %user.id,
                    old_refresh_token_id = %stored.id,
                    refresh_token_id = %row.id,
                    jti = %row.jwt_id,
                    "rotated token pair"
                );
                Ok(pair)
            }
            Redemption::AlreadyUsed => {
                tracing::warn!(
                    refresh_token_id = %stored.id,
                    user_id = %stored.user_id,
                    "refresh token redeemed concurrently"
                );
                Err(TokenError::TokenAlreadyUsed)
            }
            Redemption::Revoked => Err(TokenError::TokenRevoked),
        }
    }

    /// Returns `false` when the token was already revoked.
    pub async fn revoke(&self, token_id: Uuid) -> Result<bool, TokenError> {
        if self.refresh_tokens.find_by_id(token_id).await?.is_none() {
            return Err(TokenError::TokenNotFound);
        }
        let changed = self.refresh_tokens.revoke(token_id).await?;
        tracing::info!(refresh_token_id = %token_id, changed, "revoked refresh token");
        Ok(changed)
    }

    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, TokenError> {
        let count = self.refresh_tokens.revoke_all_for_user(user_id).await?;
        tracing::info!(%user_id, count, "revoked refresh tokens for user");
        Ok(count)
    }

    pub async fn sessions_for_user(&self, user_id: Uuid) -> Result<Vec<SessionSummary>, TokenError> {
        let now = Utc::now();
        let rows = self.refresh_tokens.find_by_user_id(user_id).await?;
        Ok(rows
            .iter()
            .map(|row| SessionSummary::from_model(row, now))
            .collect())
    }

    /// Bearer check for protected resources: signature, algorithm and expiry.
    pub fn authenticate(&self, access_token: &str) -> Result<AccessClaims, TokenError> {
        self.codec
            .authenticate(access_token, Utc::now())
            .map_err(TokenError::InvalidToken)
    }

    fn mint(
        &self,
        subject: &dyn AuthSubject,
        now: DateTime<Utc>,
    ) -> Result<(TokenPair, NewRefreshToken), TokenError> {
        let issued = self
            .codec
            .issue_at(subject, now)
            .map_err(TokenError::Signing)?;
        let expires_at = now.checked_add_signed(self.refresh_ttl).ok_or_else(|| {
            TokenError::Signing(CodecError::Encoding(
                "refresh token expiry out of range".to_string(),
            ))
        })?;
        let refresh_token = generate_refresh_token();

        let row = NewRefreshToken {
            token: refresh_token.clone(),
            jwt_id: issued.claims.jti.clone(),
            user_id: subject.id(),
            issued_at: now,
            expires_at,
        };
        let pair = TokenPair {
            access_token: issued.token,
            refresh_token,
            token_type: TOKEN_TYPE,
            expires_in: self.codec.ttl().num_seconds(),
        };
        Ok((pair, row))
    }
}
