use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult, with_timeout};
use crate::{
    auth::{NewRefreshToken, Redemption, RefreshTokenStore},
    db::entities::refresh_token::{self, Entity as RefreshToken},
};

const ENTITY: &str = "refresh_token";

#[derive(Clone)]
pub struct RefreshTokenDao {
    db: DatabaseConnection,
    timeout: Duration,
}

impl DaoBase for RefreshTokenDao {
    type Entity = RefreshToken;

    fn from_db(db: DatabaseConnection, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn active_model(id: Uuid, token: NewRefreshToken) -> refresh_token::ActiveModel {
    let issued_at = token.issued_at.fixed_offset();
    refresh_token::ActiveModel {
        id: Set(id),
        token: Set(token.token),
        jwt_id: Set(token.jwt_id),
        user_id: Set(token.user_id),
        issued_at: Set(issued_at),
        updated_at: Set(issued_at),
        expires_at: Set(token.expires_at.fixed_offset()),
        is_used: Set(false),
        is_revoked: Set(false),
        ..Default::default()
    }
}

/// Zero affected rows on a guarded update: tell "already in that state" apart from "gone".
async fn ensure_exists<C: ConnectionTrait>(conn: &C, id: Uuid) -> DaoResult<refresh_token::Model> {
    RefreshToken::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(DaoLayerError::NotFound { entity: ENTITY, id })
}

#[async_trait]
impl RefreshTokenStore for RefreshTokenDao {
    async fn insert(&self, token: NewRefreshToken) -> DaoResult<refresh_token::Model> {
        let active = active_model(Uuid::new_v4(), token);
        with_timeout("refresh_token.insert", self.timeout, async {
            active.insert(&self.db).await.map_err(DaoLayerError::Db)
        })
        .await
    }

    async fn find_by_token(&self, token: &str) -> DaoResult<Option<refresh_token::Model>> {
        with_timeout("refresh_token.find_by_token", self.timeout, async {
            RefreshToken::find()
                .filter(refresh_token::Column::Token.eq(token))
                .one(&self.db)
                .await
                .map_err(DaoLayerError::Db)
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> DaoResult<Option<refresh_token::Model>> {
        match DaoBase::find_by_id(self, id).await {
            Ok(model) => Ok(Some(model)),
            Err(DaoLayerError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> DaoResult<Vec<refresh_token::Model>> {
        with_timeout("refresh_token.find_by_user_id", self.timeout, async {
            RefreshToken::find()
                .filter(refresh_token::Column::UserId.eq(user_id))
                .order_by_desc(refresh_token::Column::IssuedAt)
                .all(&self.db)
                .await
                .map_err(DaoLayerError::Db)
        })
        .await
    }

    async fn mark_used(&self, id: Uuid) -> DaoResult<bool> {
        with_timeout("refresh_token.mark_used", self.timeout, async {
            let result = RefreshToken::update_many()
                .col_expr(refresh_token::Column::IsUsed, Expr::value(true))
                .col_expr(
                    refresh_token::Column::UpdatedAt,
                    Expr::value(Utc::now().fixed_offset()),
                )
                .filter(refresh_token::Column::Id.eq(id))
                .filter(refresh_token::Column::IsUsed.eq(false))
                .exec(&self.db)
                .await?;

            if result.rows_affected == 0 {
                ensure_exists(&self.db, id).await?;
                return Ok(false);
            }
            Ok(true)
        })
        .await
    }

    async fn redeem(&self, id: Uuid, replacement: NewRefreshToken) -> DaoResult<Redemption> {
        let active = active_model(Uuid::new_v4(), replacement);
        with_timeout("refresh_token.redeem", self.timeout, async {
            let txn = self.db.begin().await?;

            let result = RefreshToken::update_many()
                .col_expr(refresh_token::Column::IsUsed, Expr::value(true))
                .col_expr(
                    refresh_token::Column::UpdatedAt,
                    Expr::value(Utc::now().fixed_offset()),
                )
                .filter(refresh_token::Column::Id.eq(id))
                .filter(refresh_token::Column::IsUsed.eq(false))
                .filter(refresh_token::Column::IsRevoked.eq(false))
                .exec(&txn)
                .await?;

            if result.rows_affected == 0 {
                let current = ensure_exists(&txn, id).await;
                txn.rollback().await?;
                return Ok(if current?.is_revoked {
                    Redemption::Revoked
                } else {
                    Redemption::AlreadyUsed
                });
            }

            let inserted = active.insert(&txn).await?;
            txn.commit().await?;
            Ok(Redemption::Redeemed(inserted))
        })
        .await
    }

    async fn revoke(&self, id: Uuid) -> DaoResult<bool> {
        with_timeout("refresh_token.revoke", self.timeout, async {
            let result = RefreshToken::update_many()
                .col_expr(refresh_token::Column::IsRevoked, Expr::value(true))
                .col_expr(
                    refresh_token::Column::UpdatedAt,
                    Expr::value(Utc::now().fixed_offset()),
                )
                .filter(refresh_token::Column::Id.eq(id))
                .filter(refresh_token::Column::IsRevoked.eq(false))
                .exec(&self.db)
                .await?;

            if result.rows_affected == 0 {
                ensure_exists(&self.db, id).await?;
                return Ok(false);
            }
            Ok(true)
        })
        .await
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> DaoResult<u64> {
        with_timeout("refresh_token.revoke_all_for_user", self.timeout, async {
            let result = RefreshToken::update_many()
                .col_expr(refresh_token::Column::IsRevoked, Expr::value(true))
                .col_expr(
                    refresh_token::Column::UpdatedAt,
                    Expr::value(Utc::now().fixed_offset()),
                )
                .filter(refresh_token::Column::UserId.eq(user_id))
                .filter(refresh_token::Column::IsRevoked.eq(false))
                .exec(&self.db)
                .await?;
            Ok(result.rows_affected)
        })
        .await
    }
}
