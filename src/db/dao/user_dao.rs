use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult, with_timeout};
use crate::{
    auth::{IdentityStore, UserIdentity, password},
    db::entities::{prelude::User, user},
};

#[derive(Clone)]
pub struct UserDao {
    db: DatabaseConnection,
    timeout: Duration,
}

impl DaoBase for UserDao {
    type Entity = User;

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

impl UserDao {
    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<user::Model>> {
        with_timeout("user.find_by_email", self.timeout, async {
            User::find()
                .filter(user::Column::Email.eq(email))
                .one(&self.db)
                .await
                .map_err(DaoLayerError::Db)
        })
        .await
    }

    pub async fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> DaoResult<user::Model> {
        let model = user::ActiveModel {
            email: Set(email.to_string()),
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            last_login_at: Set(None),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn set_last_login(&self, id: Uuid, at: DateTime<Utc>) -> DaoResult<()> {
        let at = at.fixed_offset();
        self.update(id, move |active| {
            active.last_login_at = Set(Some(at));
        })
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl IdentityStore for UserDao {
    async fn find_user_by_email(&self, email: &str) -> DaoResult<Option<UserIdentity>> {
        Ok(self
            .find_by_email(email)
            .await?
            .as_ref()
            .map(UserIdentity::from))
    }

    async fn find_user_by_id(&self, id: Uuid) -> DaoResult<Option<UserIdentity>> {
        match self.find_by_id(id).await {
            Ok(model) => Ok(Some(UserIdentity::from(&model))),
            Err(DaoLayerError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn verify_password(&self, user: &UserIdentity, password: &str) -> DaoResult<bool> {
        let model = self.find_by_id(user.id).await?;
        password::verify_password(password, &model.password_hash).map_err(|err| {
            DaoLayerError::Corrupt {
                entity: "user",
                id: model.id,
                reason: format!("unreadable password hash: {err}"),
            }
        })
    }

    async fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> DaoResult<UserIdentity> {
        let model = UserDao::create_user(self, email, username, password_hash).await?;
        Ok(UserIdentity::from(&model))
    }

    async fn record_login(&self, user: &UserIdentity, at: DateTime<Utc>) -> DaoResult<()> {
        self.set_last_login(user.id, at).await
    }
}
