//! Initial schema: users, sites, worker types, daily records and audit logs.
//!
//! Built with the portable table builders so the same migration runs on
//! PostgreSQL and on SQLite.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::Username)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::FullName).string_len(255).not_null())
                    .col(ColumnDef::new(Users::PasswordHash).text().not_null())
                    .col(ColumnDef::new(Users::Role).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sites::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sites::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Sites::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Sites::Code)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Sites::Location).string_len(255))
                    .col(ColumnDef::new(Sites::SupervisorId).uuid())
                    .col(
                        ColumnDef::new(Sites::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Sites::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sites::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sites_supervisor")
                            .from(Sites::Table, Sites::SupervisorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WorkerTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WorkerTypes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WorkerTypes::SiteId).uuid().not_null())
                    .col(ColumnDef::new(WorkerTypes::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(WorkerTypes::DailyRate)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkerTypes::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(WorkerTypes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkerTypes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_worker_types_site")
                            .from(WorkerTypes::Table, WorkerTypes::SiteId)
                            .to(Sites::Table, Sites::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DailyRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DailyRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DailyRecords::SiteId).uuid().not_null())
                    .col(ColumnDef::new(DailyRecords::SupervisorId).uuid().not_null())
                    .col(ColumnDef::new(DailyRecords::RecordDate).date().not_null())
                    .col(ColumnDef::new(DailyRecords::TotalProduction).decimal_len(14, 3))
                    .col(
                        ColumnDef::new(DailyRecords::ProductionUnit)
                            .string_len(20)
                            .not_null()
                            .default("tons"),
                    )
                    .col(ColumnDef::new(DailyRecords::TasksCompleted).integer())
                    .col(ColumnDef::new(DailyRecords::WeatherConditions).string_len(100))
                    .col(ColumnDef::new(DailyRecords::SupervisorNotes).text())
                    .col(
                        ColumnDef::new(DailyRecords::IsLocked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DailyRecords::CorrectionCount)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(DailyRecords::CorrectionCount).gte(0)),
                    )
                    .col(ColumnDef::new(DailyRecords::LastCorrectionReason).text())
                    .col(
                        ColumnDef::new(DailyRecords::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(DailyRecords::LockedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(DailyRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DailyRecords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_daily_records_site")
                            .from(DailyRecords::Table, DailyRecords::SiteId)
                            .to(Sites::Table, Sites::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_daily_records_supervisor")
                            .from(DailyRecords::Table, DailyRecords::SupervisorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_daily_records_site_date")
                    .table(DailyRecords::Table)
                    .col(DailyRecords::SiteId)
                    .col(DailyRecords::RecordDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_daily_records_unlocked_date")
                    .table(DailyRecords::Table)
                    .col(DailyRecords::IsLocked)
                    .col(DailyRecords::RecordDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DailyRecordItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DailyRecordItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DailyRecordItems::DailyRecordId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DailyRecordItems::WorkerTypeId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DailyRecordItems::WorkerCount)
                            .integer()
                            .not_null()
                            .check(Expr::col(DailyRecordItems::WorkerCount).gt(0)),
                    )
                    .col(
                        ColumnDef::new(DailyRecordItems::TotalPayment)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DailyRecordItems::PaymentPerWorker)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(DailyRecordItems::WorkerNames).json())
                    .col(ColumnDef::new(DailyRecordItems::AttendanceNotes).text())
                    .col(
                        ColumnDef::new(DailyRecordItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_daily_record_items_record")
                            .from(DailyRecordItems::Table, DailyRecordItems::DailyRecordId)
                            .to(DailyRecords::Table, DailyRecords::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_daily_record_items_worker_type")
                            .from(DailyRecordItems::Table, DailyRecordItems::WorkerTypeId)
                            .to(WorkerTypes::Table, WorkerTypes::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_daily_record_items_record")
                    .table(DailyRecordItems::Table)
                    .col(DailyRecordItems::DailyRecordId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AuditLogs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(AuditLogs::UserId).uuid())
                    .col(ColumnDef::new(AuditLogs::Action).string_len(32).not_null())
                    .col(ColumnDef::new(AuditLogs::TableName).string_len(64).not_null())
                    .col(ColumnDef::new(AuditLogs::RecordId).uuid())
                    .col(ColumnDef::new(AuditLogs::OldValues).json())
                    .col(ColumnDef::new(AuditLogs::NewValues).json())
                    .col(ColumnDef::new(AuditLogs::Description).text())
                    .col(ColumnDef::new(AuditLogs::IpAddress).string_len(45))
                    .col(ColumnDef::new(AuditLogs::UserAgent).text())
                    .col(ColumnDef::new(AuditLogs::CorrectionReason).text())
                    .col(ColumnDef::new(AuditLogs::CorrectionCount).integer())
                    .col(
                        ColumnDef::new(AuditLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_audit_logs_user")
                            .from(AuditLogs::Table, AuditLogs::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_logs_record")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::TableName)
                    .col(AuditLogs::RecordId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_logs_created_at")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DailyRecordItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DailyRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WorkerTypes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sites::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    FullName,
    PasswordHash,
    Role,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Sites {
    Table,
    Id,
    Name,
    Code,
    Location,
    SupervisorId,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum WorkerTypes {
    Table,
    Id,
    SiteId,
    Name,
    DailyRate,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum DailyRecords {
    Table,
    Id,
    SiteId,
    SupervisorId,
    RecordDate,
    TotalProduction,
    ProductionUnit,
    TasksCompleted,
    WeatherConditions,
    SupervisorNotes,
    IsLocked,
    CorrectionCount,
    LastCorrectionReason,
    Version,
    LockedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum DailyRecordItems {
    Table,
    Id,
    DailyRecordId,
    WorkerTypeId,
    WorkerCount,
    TotalPayment,
    PaymentPerWorker,
    WorkerNames,
    AttendanceNotes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AuditLogs {
    Table,
    Id,
    UserId,
    Action,
    TableName,
    RecordId,
    OldValues,
    NewValues,
    Description,
    IpAddress,
    UserAgent,
    CorrectionReason,
    CorrectionCount,
    CreatedAt,
}
