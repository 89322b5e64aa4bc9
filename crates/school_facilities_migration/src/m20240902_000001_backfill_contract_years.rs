use chrono::{Datelike, NaiveDate};
use sea_orm::sea_query::OnConflict;
use sea_orm::{EntityTrait, Set, TransactionTrait};
use sea_orm_migration::prelude::*;
use tracing::{info, warn};

use school_facilities_entity::{contract, contract_year};

use crate::error::StepError;
use crate::migrator::{Criticality, StepContext, StepKind, StepTrait, Tracking};

/// 周期性合同最多向后生成的年数
pub const HORIZON_YEARS: i32 = 30;

/// 为已有合同生成年度记录，(contract_id, year) 已存在的跳过
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
        let txn = ctx.db.begin().await?;
        let contracts = contract::Entity::find().all(&txn).await?;

        let mut rows = 0;
        for c in &contracts {
            let Some(start_year) = start_year(&c.start_date) else {
                warn!("合同 {} 的开始日期 {} 无法解析，跳过", c.id, c.start_date);
                continue;
            };

            let years = cycle_years(start_year, c.recurrence_interval_years);
            rows += years.len();
            let models = years.into_iter().map(|year| contract_year::ActiveModel {
                contract_id: Set(c.id),
                year: Set(year),
                status: Set("pending".to_string()),
            });
            contract_year::Entity::insert_many(models)
                .on_conflict(
                    OnConflict::columns([contract_year::Column::ContractId, contract_year::Column::Year])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;
        info!("已为 {} 个合同检查 {} 条年度记录", contracts.len(), rows);
        Ok(())
    }
}

fn start_year(start_date: &str) -> Option<i32> {
    NaiveDate::parse_from_str(start_date.trim(), "%Y-%m-%d")
        .ok()
        .map(|date| date.year())
}

/// 从开始年份起每个周期一条，截止到开始年份 + 30；非周期合同只有开始年份一条
pub fn cycle_years(start_year: i32, interval_years: Option<i32>) -> Vec<i32> {
    match interval_years {
        Some(interval) if interval > 0 => (start_year..=start_year + HORIZON_YEARS)
            .step_by(interval as usize)
            .collect(),
        _ => vec![start_year],
    }
}
