use sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::*;
use tracing::info;

use crate::error::StepError;
use crate::migrator::{Criticality, StepContext, StepKind, StepTrait, Tracking};

/// 按维修记录重新汇总预算类目的已用金额。类目名称不区分大小写，且只统计同一学校
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl StepTrait for Migration {
    fn kind(&self) -> StepKind {
        StepKind::Data
    }

    fn criticality(&self) -> Criticality {
        Criticality::NonCritical
    }

    fn tracking(&self) -> Tracking {
        Tracking::Tracked
    }

    fn requires(&self) -> &'static [&'static str] {
        &["m20240520_000001_add_budget_and_contract_columns"]
    }

    async fn up(&self, ctx: &StepContext<'_>) -> Result<(), StepError> {
        // 单条语句完成，天然是原子的
        let update_sql = r#"
            UPDATE budget_categories
            SET spent = COALESCE((
                SELECT SUM(mh.cost)
                FROM maintenance_history mh
                WHERE mh.school_id = budget_categories.school_id
                  AND LOWER(mh.category) = LOWER(budget_categories.name)
            ), 0)
        "#;

        let result = ctx.db.execute_unprepared(update_sql).await?;
        info!("已重新计算 {} 个预算类目的已用金额", result.rows_affected());
        Ok(())
    }
}
