use sea_orm::{EntityTrait, PaginatorTrait, Set, TransactionTrait};
use sea_orm_migration::prelude::*;
use tracing::{debug, info};

use school_facilities_entity::{board, school};

use crate::error::StepError;
use crate::migrator::{Criticality, StepContext, StepKind, StepTrait, Tracking};
use crate::tracking::now_string;

/// 写入默认董事会与学校。只在学校表为空时执行，不做通用的 upsert
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl StepTrait for Migration {
    fn kind(&self) -> StepKind {
        StepKind::Seed
    }

    fn criticality(&self) -> Criticality {
        Criticality::Critical
    }

    fn tracking(&self) -> Tracking {
        Tracking::SelfIdempotent
    }

    fn requires(&self) -> &'static [&'static str] {
        &[
            "m20240108_000001_create_base_schema",
            "m20240311_000002_add_multi_tenant_columns",
        ]
    }

    async fn up(&self, ctx: &StepContext<'_>) -> Result<(), StepError> {
        let seed = ctx.seed;
        let txn = ctx.db.begin().await?;

        if school::Entity::find().count(&txn).await? > 0 {
            debug!("学校表已有数据，跳过默认学校初始化");
            txn.rollback().await?;
            return Ok(());
        }

        let created_at = now_string();

        if board::Entity::find().count(&txn).await? == 0 && !seed.boards.is_empty() {
            let boards = seed.boards.iter().map(|b| board::ActiveModel {
                id: Set(b.id.clone()),
                name: Set(b.name.clone()),
                created_at: Set(created_at.clone()),
            });
            board::Entity::insert_many(boards).exec_without_returning(&txn).await?;
            info!("已写入 {} 个默认董事会", seed.boards.len());
        }

        if !seed.schools.is_empty() {
            let schools = seed.schools.iter().map(|s| school::ActiveModel {
                id: Set(s.id.clone()),
                name: Set(s.name.clone()),
                board_id: Set(s.board_id.clone()),
                created_at: Set(created_at.clone()),
            });
            school::Entity::insert_many(schools).exec_without_returning(&txn).await?;
            info!("已写入 {} 所默认学校", seed.schools.len());
        }

        txn.commit().await?;
        Ok(())
    }
}
