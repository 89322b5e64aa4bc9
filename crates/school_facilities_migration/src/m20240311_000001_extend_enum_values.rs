use sea_orm_migration::prelude::*;
use tracing::debug;

use crate::catalog::{add_enum_value, DbEnum};
use crate::error::StepError;
use crate::migrator::{Criticality, StepContext, StepKind, StepTrait, Tracking};

/// 基础结构上线之后新增的枚举取值，只能追加，不能删除或改名
const ADDED_VALUES: [(DbEnum, &str); 5] = [
    (DbEnum::UserRole, "board_admin"),
    (DbEnum::TicketStatus, "on_hold"),
    (DbEnum::TicketStatus, "awaiting_parts"),
    (DbEnum::DocumentCategory, "inspection_report"),
    (DbEnum::DocumentCategory, "floor_plan"),
];

/// 每次启动都对照目录检查，缺哪个补哪个
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

        let mut added = 0;
        for (db_enum, label) in ADDED_VALUES {
            if add_enum_value(&manager, db_enum, label).await? {
                added += 1;
            }
        }
        debug!("枚举取值检查完成，新增 {} 个", added);

        Ok(())
    }
}
