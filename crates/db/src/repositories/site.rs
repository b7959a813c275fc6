//! Site repository.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::sites;

/// Input for creating a site.
#[derive(Debug, Clone)]
pub struct CreateSiteInput {
    /// Display name.
    pub name: String,
    /// Unique short code.
    pub code: String,
    /// Free-text location.
    pub location: Option<String>,
    /// Assigned supervisor.
    pub supervisor_id: Option<Uuid>,
}

/// Site repository.
#[derive(Debug, Clone)]
pub struct SiteRepository {
    db: DatabaseConnection,
}

impl SiteRepository {
    /// Creates a new site repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an active site.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, e.g. on a duplicate code.
    pub async fn create(&self, input: CreateSiteInput) -> Result<sites::Model, DbErr> {
        let now = chrono::Utc::now().into();
        sites::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            code: Set(input.code),
            location: Set(input.location),
            supervisor_id: Set(input.supervisor_id),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
    }

    /// Finds a site by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<sites::Model>, DbErr> {
        sites::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds a site by its code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<sites::Model>, DbErr> {
        sites::Entity::find()
            .filter(sites::Column::Code.eq(code))
            .one(&self.db)
            .await
    }

    /// Lists active sites ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active(&self) -> Result<Vec<sites::Model>, DbErr> {
        sites::Entity::find()
            .filter(sites::Column::IsActive.eq(true))
            .order_by_asc(sites::Column::Code)
            .all(&self.db)
            .await
    }

    /// Assigns (or clears) the site's supervisor.
    ///
    /// # Errors
    ///
    /// Returns `DbErr::RecordNotFound` if the site does not exist.
    pub async fn assign_supervisor(
        &self,
        site_id: Uuid,
        supervisor_id: Option<Uuid>,
    ) -> Result<sites::Model, DbErr> {
        let site = self
            .find_by_id(site_id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("site {site_id}")))?;

        let mut active: sites::ActiveModel = site.into();
        active.supervisor_id = Set(supervisor_id);
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(&self.db).await
    }
}
