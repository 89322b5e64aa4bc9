use sea_orm::{EntityTrait, QueryOrder, QuerySelect};
use sea_orm_migration::prelude::*;
use tracing::{info, warn};

use school_facilities_entity::school;

use crate::error::StepError;
use crate::migrator::{Criticality, StepContext, StepKind, StepTrait, Tracking};

/// 为每所学校准备文档存储桶。创建操作本身幂等，所以每次启动都执行
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
        Tracking::SelfIdempotent
    }

    fn requires(&self) -> &'static [&'static str] {
        &["m20240312_000001_seed_reference_data"]
    }

    async fn up(&self, ctx: &StepContext<'_>) -> Result<(), StepError> {
        let school_ids: Vec<String> = school::Entity::find()
            .select_only()
            .column(school::Column::Id)
            .order_by_asc(school::Column::Id)
            .into_tuple()
            .all(ctx.db)
            .await?;

        // 单个学校失败不影响其他学校，全部尝试完后再返回第一个错误
        let mut first_error: Option<StepError> = None;
        let mut failed = 0;
        for school_id in &school_ids {
            let bucket = ctx.seed.bucket_name(school_id);
            if let Err(e) = ctx.buckets.create_bucket_if_absent(&bucket).await {
                warn!("创建存储桶 {} 失败: {:#}", bucket, e);
                failed += 1;
                first_error.get_or_insert(StepError::Storage { bucket, source: e });
            }
        }

        match first_error {
            Some(e) => {
                warn!("{}/{} 个学校存储桶创建失败", failed, school_ids.len());
                Err(e)
            }
            None => {
                info!("已确认 {} 个学校存储桶", school_ids.len());
                Ok(())
            }
        }
    }
}
