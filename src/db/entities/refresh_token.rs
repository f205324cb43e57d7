use chrono::{DateTime, Utc};
use sea_orm::{Set, entity::prelude::*};

use crate::{
    auth::RefreshTokenState,
    db::dao::{HasIdActiveModel, TimestampedActiveModel},
};

/// One row per issued refresh token. Rows are never deleted by rotation; a consumed
/// token stays behind with `is_used = true` so replays can be recognised.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "refresh_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub token: String,
    /// `jti` of the access token issued alongside this row.
    #[sea_orm(indexed)]
    pub jwt_id: String,
    #[sea_orm(indexed)]
    pub user_id: Uuid,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub issued_at: DateTimeWithTimeZone,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub updated_at: DateTimeWithTimeZone,
    pub expires_at: DateTimeWithTimeZone,
    #[sea_orm(default_value = false)]
    pub is_used: bool,
    #[sea_orm(default_value = false)]
    pub is_revoked: bool,
    #[sea_orm(belongs_to, from = "user_id", to = "id", on_delete = "Cascade")]
    pub user: HasOne<super::user::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Precedence matches the order rotation checks the row in.
    pub fn state(&self, now: DateTime<Utc>) -> RefreshTokenState {
        if self.is_expired_at(now) {
            RefreshTokenState::Expired
        } else if self.is_revoked {
            RefreshTokenState::Revoked
        } else if self.is_used {
            RefreshTokenState::Used
        } else {
            RefreshTokenState::Active
        }
    }
}

impl HasIdActiveModel for ActiveModel {
    fn set_id(&mut self, id: Uuid) {
        self.id = Set(id);
    }
}

impl TimestampedActiveModel for ActiveModel {
    fn set_created_at(&mut self, ts: DateTimeWithTimeZone) {
        self.issued_at = Set(ts);
    }

    fn set_updated_at(&mut self, ts: DateTimeWithTimeZone) {
        self.updated_at = Set(ts);
    }
}
