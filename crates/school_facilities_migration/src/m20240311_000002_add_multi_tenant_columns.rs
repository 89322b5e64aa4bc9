use sea_orm_migration::prelude::*;

use crate::catalog::add_column_if_missing;
use crate::error::StepError;
use crate::migrator::{Criticality, StepContext, StepKind, StepTrait, Tracking};

/// 多学校支持：学校归属董事会，用户可关联多所学校并指定默认学校
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
        Tracking::Tracked
    }

    fn requires(&self) -> &'static [&'static str] {
        &["m20240108_000001_create_base_schema"]
    }

    async fn up(&self, ctx: &StepContext<'_>) -> Result<(), StepError> {
        let manager = ctx.schema_manager();

        // SQLite 不支持在已存在的表上添加外键约束，board_id 的完整性由应用层保证
        add_column_if_missing(
            &manager,
            "schools",
            "board_id",
            Table::alter()
                .table(Schools::Table)
                .add_column(ColumnDef::new(Schools::BoardId).string().null())
                .to_owned(),
        )
        .await?;

        add_column_if_missing(
            &manager,
            "user_schools",
            "is_default",
            Table::alter()
                .table(UserSchools::Table)
                .add_column(
                    ColumnDef::new(UserSchools::IsDefault)
                        .boolean()
                        .not_null()
                        .default(false),
                )
                .to_owned(),
        )
        .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_schools_board_id")
                    .table(Schools::Table)
                    .col(Schools::BoardId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_schools_user_id")
                    .table(UserSchools::Table)
                    .col(UserSchools::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Schools {
    Table,
    BoardId,
}

#[derive(DeriveIden)]
enum UserSchools {
    Table,
    UserId,
    IsDefault,
}
