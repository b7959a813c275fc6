//! `SeaORM` Entity for daily_record_items table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "daily_record_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub daily_record_id: Uuid,
    pub worker_type_id: Uuid,
    pub worker_count: i32,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub total_payment: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub payment_per_worker: Decimal,
    pub worker_names: Option<Json>,
    #[sea_orm(column_type = "Text", nullable)]
    pub attendance_notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::daily_records::Entity",
        from = "Column::DailyRecordId",
        to = "super::daily_records::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    DailyRecords,
    #[sea_orm(
        belongs_to = "super::worker_types::Entity",
        from = "Column::WorkerTypeId",
        to = "super::worker_types::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    WorkerTypes,
}

impl Related<super::daily_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DailyRecords.def()
    }
}

impl Related<super::worker_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkerTypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
