//! Worker type repository.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::worker_types;

/// Worker type repository.
#[derive(Debug, Clone)]
pub struct WorkerTypeRepository {
    db: DatabaseConnection,
}

impl WorkerTypeRepository {
    /// Creates a new worker type repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an active worker type for a site.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(
        &self,
        site_id: Uuid,
        name: &str,
        daily_rate: Decimal,
    ) -> Result<worker_types::Model, DbErr> {
        let now = chrono::Utc::now().into();
        worker_types::ActiveModel {
            id: Set(Uuid::new_v4()),
            site_id: Set(site_id),
            name: Set(name.to_string()),
            daily_rate: Set(daily_rate),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
    }

    /// Lists a site's active worker types by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_site(&self, site_id: Uuid) -> Result<Vec<worker_types::Model>, DbErr> {
        worker_types::Entity::find()
            .filter(worker_types::Column::SiteId.eq(site_id))
            .filter(worker_types::Column::IsActive.eq(true))
            .order_by_asc(worker_types::Column::Name)
            .all(&self.db)
            .await
    }
}
