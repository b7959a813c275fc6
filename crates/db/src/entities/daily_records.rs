//! `SeaORM` Entity for daily_records table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "daily_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub site_id: Uuid,
    pub supervisor_id: Uuid,
    pub record_date: Date,
    #[sea_orm(column_type = "Decimal(Some((14, 3)))", nullable)]
    pub total_production: Option<Decimal>,
    pub production_unit: String,
    pub tasks_completed: Option<i32>,
    pub weather_conditions: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub supervisor_notes: Option<String>,
    pub is_locked: bool,
    pub correction_count: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub last_correction_reason: Option<String>,
    pub version: i32,
    pub locked_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sites::Entity",
        from = "Column::SiteId",
        to = "super::sites::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Sites,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SupervisorId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Users,
    #[sea_orm(has_many = "super::daily_record_items::Entity")]
    DailyRecordItems,
}

impl Related<super::sites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sites.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::daily_record_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DailyRecordItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
