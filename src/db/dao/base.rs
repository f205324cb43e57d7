use std::{future::Future, time::Duration};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, FromQueryResult, IntoActiveModel,
    PrimaryKeyTrait,
};
use uuid::Uuid;

use super::base_traits::{HasIdActiveModel, TimestampedActiveModel};
use super::error::{DaoLayerError, DaoResult};

pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Bounds a store round-trip so a stalled database surfaces as an error instead of a hang.
pub async fn with_timeout<T>(
    operation: &'static str,
    timeout: Duration,
    fut: impl Future<Output = DaoResult<T>>,
) -> DaoResult<T> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(operation, ?timeout, "database operation timed out");
            Err(DaoLayerError::Timeout { operation, timeout })
        }
    }
}

#[async_trait::async_trait]
pub trait DaoBase: Clone + Send + Sync + Sized
where
    <Self::Entity as EntityTrait>::Model:
        FromQueryResult + IntoActiveModel<<Self::Entity as EntityTrait>::ActiveModel> + Send + Sync,
    <Self::Entity as EntityTrait>::ActiveModel:
        ActiveModelTrait<Entity = Self::Entity> + HasIdActiveModel + TimestampedActiveModel + Send,
    <<Self::Entity as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType:
        From<Uuid> + Send + Sync,
{
    type Entity: EntityTrait + Send + Sync;

    fn from_db(db: DatabaseConnection, timeout: Duration) -> Self;

    fn new(db: &DatabaseConnection) -> Self {
        Self::from_db(db.clone(), DEFAULT_OPERATION_TIMEOUT)
    }

    fn db(&self) -> &DatabaseConnection;

    fn timeout(&self) -> Duration;

    async fn create(
        &self,
        data: impl IntoActiveModel<<Self::Entity as EntityTrait>::ActiveModel> + Send,
    ) -> DaoResult<<Self::Entity as EntityTrait>::Model> {
        let now = Utc::now().fixed_offset();
        let mut active = data.into_active_model();
        active.set_id(Uuid::new_v4());
        active.set_created_at(now);
        active.set_updated_at(now);
        with_timeout("create", self.timeout(), async {
            active.insert(self.db()).await.map_err(DaoLayerError::Db)
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> DaoResult<<Self::Entity as EntityTrait>::Model> {
        let model = with_timeout("find_by_id", self.timeout(), async {
            Self::Entity::find_by_id(id)
                .one(self.db())
                .await
                .map_err(DaoLayerError::Db)
        })
        .await?;

        model.ok_or(DaoLayerError::NotFound {
            entity: std::any::type_name::<Self::Entity>(),
            id,
        })
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> DaoResult<<Self::Entity as EntityTrait>::Model>
    where
        F: for<'a> FnOnce(&'a mut <Self::Entity as EntityTrait>::ActiveModel) + Send,
    {
        let model = self.find_by_id(id).await?;

        let mut active = model.into_active_model();
        apply(&mut active);
        active.set_updated_at(Utc::now().fixed_offset());

        with_timeout("update", self.timeout(), async {
            active.update(self.db()).await.map_err(DaoLayerError::Db)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::with_timeout;
    use crate::db::dao::DaoLayerError;

    #[tokio::test]
    async fn with_timeout_passes_through_results() {
        let value = with_timeout("noop", Duration::from_millis(50), async { Ok(7) })
            .await
            .expect("future should complete");

        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn with_timeout_reports_stalled_operations() {
        let err = with_timeout::<()>("stall", Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await
        .expect_err("stalled future should time out");

        assert!(matches!(
            err,
            DaoLayerError::Timeout {
                operation: "stall",
                ..
            }
        ));
    }
}
