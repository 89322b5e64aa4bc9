use sea_orm_migration::prelude::*;

use crate::error::StepError;
use crate::migrator::{Criticality, StepContext, StepKind, StepTrait, Tracking};

/// 登录会话表，结构与常见的会话存储中间件一致
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

    fn requires(&self) -> &'static [&'static str] {
        &["m20240108_000001_create_base_schema"]
    }

    async fn up(&self, ctx: &StepContext<'_>) -> Result<(), StepError> {
        let manager = ctx.schema_manager();

        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sessions::Sid).string().not_null().primary_key())
                    .col(ColumnDef::new(Sessions::Sess).text().not_null())
                    .col(ColumnDef::new(Sessions::Expire).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // 清理过期会话时按过期时间扫描
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sessions_expire")
                    .table(Sessions::Table)
                    .col(Sessions::Expire)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Sessions {
    Table,
    Sid,
    Sess,
    Expire,
}
