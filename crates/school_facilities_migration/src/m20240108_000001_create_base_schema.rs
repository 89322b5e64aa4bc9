use sea_orm_migration::prelude::*;

use crate::catalog::{enum_column, ensure_enum, DbEnum};
use crate::error::StepError;
use crate::migrator::{Criticality, StepContext, StepKind, StepTrait, Tracking};

/// 基础表结构，必须是第一个步骤。全部使用 IF NOT EXISTS，每次启动都执行
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl StepTrait for Migration {
    fn kind(&self) -> StepKind {
        StepKind::Schema
    }

    fn criticality(&self) -> Criticality {
        Criticality::Critical
    }

    fn tracking(&self) -> Tracking {
        Tracking::SelfIdempotent
    }

    async fn up(&self, ctx: &StepContext<'_>) -> Result<(), StepError> {
        let manager = ctx.schema_manager();
        let backend = manager.get_database_backend();

        // 枚举类型需要先于引用它们的表创建
        ensure_enum(&manager, DbEnum::UserRole, &["admin", "school_admin", "staff", "viewer"]).await?;
        ensure_enum(&manager, DbEnum::TicketStatus, &["open", "in_progress", "resolved", "closed"]).await?;
        ensure_enum(&manager, DbEnum::TicketPriority, &["low", "medium", "high", "urgent"]).await?;
        ensure_enum(
            &manager,
            DbEnum::DocumentCategory,
            &["contract", "invoice", "manual", "photo", "other"],
        )
        .await?;

        // 租户与用户
        manager
            .create_table(
                Table::create()
                    .table(Boards::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Boards::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Boards::Name).string().not_null())
                    .col(ColumnDef::new(Boards::CreatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Schools::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Schools::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Schools::Name).string().not_null())
                    .col(ColumnDef::new(Schools::CreatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::DisplayName).string().not_null())
                    .col(
                        enum_column(backend, Users::Role, DbEnum::UserRole)
                            .not_null()
                            .default("staff"),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().null())
                    .col(ColumnDef::new(Users::CreatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserSchools::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserSchools::UserId).string().not_null())
                    .col(ColumnDef::new(UserSchools::SchoolId).string().not_null())
                    .col(ColumnDef::new(UserSchools::CreatedAt).string().not_null())
                    .primary_key(Index::create().col(UserSchools::UserId).col(UserSchools::SchoolId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_schools_user")
                            .from(UserSchools::Table, UserSchools::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_schools_school")
                            .from(UserSchools::Table, UserSchools::SchoolId)
                            .to(Schools::Table, Schools::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 建筑、房间、场地
        manager
            .create_table(
                Table::create()
                    .table(Buildings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Buildings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Buildings::SchoolId).string().not_null())
                    .col(ColumnDef::new(Buildings::Name).string().not_null())
                    .col(ColumnDef::new(Buildings::Address).string().null())
                    .col(ColumnDef::new(Buildings::BuildYear).integer().null())
                    .col(ColumnDef::new(Buildings::FloorArea).double().null())
                    .col(ColumnDef::new(Buildings::CreatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Rooms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rooms::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rooms::BuildingId).integer().not_null())
                    .col(ColumnDef::new(Rooms::Name).string().not_null())
                    .col(ColumnDef::new(Rooms::Floor).integer().null())
                    .col(ColumnDef::new(Rooms::Area).double().null())
                    .col(ColumnDef::new(Rooms::Purpose).string().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rooms_building")
                            .from(Rooms::Table, Rooms::BuildingId)
                            .to(Buildings::Table, Buildings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Terrains::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Terrains::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Terrains::SchoolId).string().not_null())
                    .col(ColumnDef::new(Terrains::Name).string().not_null())
                    .col(ColumnDef::new(Terrains::SurfaceArea).double().null())
                    .col(ColumnDef::new(Terrains::Description).text().null())
                    .to_owned(),
            )
            .await?;

        // 报修单与预约
        manager
            .create_table(
                Table::create()
                    .table(Tickets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tickets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tickets::SchoolId).string().not_null())
                    .col(ColumnDef::new(Tickets::BuildingId).integer().null())
                    .col(ColumnDef::new(Tickets::RoomId).integer().null())
                    .col(ColumnDef::new(Tickets::Title).string().not_null())
                    .col(ColumnDef::new(Tickets::Description).text().null())
                    .col(
                        enum_column(backend, Tickets::Status, DbEnum::TicketStatus)
                            .not_null()
                            .default("open"),
                    )
                    .col(
                        enum_column(backend, Tickets::Priority, DbEnum::TicketPriority)
                            .not_null()
                            .default("medium"),
                    )
                    .col(ColumnDef::new(Tickets::ReportedBy).string().null())
                    .col(ColumnDef::new(Tickets::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Tickets::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Appointments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Appointments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Appointments::SchoolId).string().not_null())
                    .col(ColumnDef::new(Appointments::TicketId).integer().null())
                    .col(ColumnDef::new(Appointments::Title).string().not_null())
                    .col(ColumnDef::new(Appointments::ScheduledAt).string().not_null())
                    .col(ColumnDef::new(Appointments::Contractor).string().null())
                    .col(ColumnDef::new(Appointments::Notes).text().null())
                    .to_owned(),
            )
            .await?;

        // 合同、检查报告
        manager
            .create_table(
                Table::create()
                    .table(Contracts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contracts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contracts::SchoolId).string().not_null())
                    .col(ColumnDef::new(Contracts::Name).string().not_null())
                    .col(ColumnDef::new(Contracts::Vendor).string().null())
                    .col(ColumnDef::new(Contracts::StartDate).string().not_null())
                    .col(ColumnDef::new(Contracts::EndDate).string().null())
                    .col(ColumnDef::new(Contracts::CreatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InspectionReports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InspectionReports::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InspectionReports::SchoolId).string().not_null())
                    .col(ColumnDef::new(InspectionReports::BuildingId).integer().null())
                    .col(ColumnDef::new(InspectionReports::InspectedOn).string().not_null())
                    .col(ColumnDef::new(InspectionReports::Inspector).string().null())
                    .col(ColumnDef::new(InspectionReports::Findings).text().null())
                    .col(ColumnDef::new(InspectionReports::Score).integer().null())
                    .to_owned(),
            )
            .await?;

        // 预算与投资
        manager
            .create_table(
                Table::create()
                    .table(BudgetCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BudgetCategories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BudgetCategories::SchoolId).string().not_null())
                    .col(ColumnDef::new(BudgetCategories::Name).string().not_null())
                    .col(ColumnDef::new(BudgetCategories::Year).integer().not_null())
                    .col(ColumnDef::new(BudgetCategories::Budget).double().not_null().default(0.0))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MaintenanceHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MaintenanceHistory::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MaintenanceHistory::SchoolId).string().not_null())
                    .col(ColumnDef::new(MaintenanceHistory::Category).string().not_null())
                    .col(ColumnDef::new(MaintenanceHistory::Description).text().null())
                    .col(ColumnDef::new(MaintenanceHistory::Cost).double().not_null().default(0.0))
                    .col(ColumnDef::new(MaintenanceHistory::PerformedOn).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Investments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Investments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Investments::SchoolId).string().not_null())
                    .col(ColumnDef::new(Investments::Title).string().not_null())
                    .col(ColumnDef::new(Investments::PlannedYear).integer().not_null())
                    .col(ColumnDef::new(Investments::EstimatedCost).double().not_null().default(0.0))
                    .col(ColumnDef::new(Investments::Status).string_len(20).not_null().default("planned"))
                    .to_owned(),
            )
            .await?;

        // 文件元数据，文件本体在对象存储中
        manager
            .create_table(
                Table::create()
                    .table(Documents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Documents::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Documents::SchoolId).string().not_null())
                    .col(
                        enum_column(backend, Documents::Category, DbEnum::DocumentCategory)
                            .not_null()
                            .default("other"),
                    )
                    .col(ColumnDef::new(Documents::FileName).string().not_null())
                    .col(ColumnDef::new(Documents::ObjectKey).string().not_null())
                    .col(ColumnDef::new(Documents::UploadedBy).string().null())
                    .col(ColumnDef::new(Documents::UploadedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        // 按学校过滤是最常见的查询
        let school_indexes = [
            ("idx_buildings_school_id", Buildings::Table.into_iden(), Buildings::SchoolId.into_iden()),
            ("idx_terrains_school_id", Terrains::Table.into_iden(), Terrains::SchoolId.into_iden()),
            ("idx_tickets_school_id", Tickets::Table.into_iden(), Tickets::SchoolId.into_iden()),
            ("idx_appointments_school_id", Appointments::Table.into_iden(), Appointments::SchoolId.into_iden()),
            ("idx_contracts_school_id", Contracts::Table.into_iden(), Contracts::SchoolId.into_iden()),
            (
                "idx_inspection_reports_school_id",
                InspectionReports::Table.into_iden(),
                InspectionReports::SchoolId.into_iden(),
            ),
            (
                "idx_budget_categories_school_id",
                BudgetCategories::Table.into_iden(),
                BudgetCategories::SchoolId.into_iden(),
            ),
            ("idx_investments_school_id", Investments::Table.into_iden(), Investments::SchoolId.into_iden()),
            ("idx_documents_school_id", Documents::Table.into_iden(), Documents::SchoolId.into_iden()),
        ];
        for (name, table, column) in school_indexes {
            manager
                .create_index(Index::create().if_not_exists().name(name).table(table).col(column).to_owned())
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tickets_school_status")
                    .table(Tickets::Table)
                    .col(Tickets::SchoolId)
                    .col(Tickets::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_maintenance_history_school_category")
                    .table(MaintenanceHistory::Table)
                    .col(MaintenanceHistory::SchoolId)
                    .col(MaintenanceHistory::Category)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Boards {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Schools {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    DisplayName,
    Role,
    PasswordHash,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserSchools {
    Table,
    UserId,
    SchoolId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Buildings {
    Table,
    Id,
    SchoolId,
    Name,
    Address,
    BuildYear,
    FloorArea,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Rooms {
    Table,
    Id,
    BuildingId,
    Name,
    Floor,
    Area,
    Purpose,
}

#[derive(DeriveIden)]
enum Terrains {
    Table,
    Id,
    SchoolId,
    Name,
    SurfaceArea,
    Description,
}

#[derive(DeriveIden)]
enum Tickets {
    Table,
    Id,
    SchoolId,
    BuildingId,
    RoomId,
    Title,
    Description,
    Status,
    Priority,
    ReportedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Appointments {
    Table,
    Id,
    SchoolId,
    TicketId,
    Title,
    ScheduledAt,
    Contractor,
    Notes,
}

#[derive(DeriveIden)]
enum Contracts {
    Table,
    Id,
    SchoolId,
    Name,
    Vendor,
    StartDate,
    EndDate,
    CreatedAt,
}

#[derive(DeriveIden)]
enum InspectionReports {
    Table,
    Id,
    SchoolId,
    BuildingId,
    InspectedOn,
    Inspector,
    Findings,
    Score,
}

#[derive(DeriveIden)]
enum BudgetCategories {
    Table,
    Id,
    SchoolId,
    Name,
    Year,
    Budget,
}

#[derive(DeriveIden)]
enum MaintenanceHistory {
    Table,
    Id,
    SchoolId,
    Category,
    Description,
    Cost,
    PerformedOn,
}

#[derive(DeriveIden)]
enum Investments {
    Table,
    Id,
    SchoolId,
    Title,
    PlannedYear,
    EstimatedCost,
    Status,
}

#[derive(DeriveIden)]
enum Documents {
    Table,
    Id,
    SchoolId,
    Category,
    FileName,
    ObjectKey,
    UploadedBy,
    UploadedAt,
}
