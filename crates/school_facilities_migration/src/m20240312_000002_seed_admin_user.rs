use sea_orm::{EntityTrait, Set};
use sea_orm_migration::prelude::*;
use tracing::{debug, info};

use school_facilities_entity::sea_orm_active_enums::UserRole;
use school_facilities_entity::user;

use crate::error::StepError;
use crate::migrator::{Criticality, StepContext, StepKind, StepTrait, Tracking};
use crate::tracking::now_string;

/// 内置管理员账号。每次启动按固定 ID 检查，数据被重置后会重新创建
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl StepTrait for Migration {
    fn kind(&self) -> StepKind {
        StepKind::Seed
    }

    fn criticality(&self) -> Criticality {
        Criticality::NonCritical
    }

    fn tracking(&self) -> Tracking {
        Tracking::SelfIdempotent
    }

    fn requires(&self) -> &'static [&'static str] {
        &[
            "m20240108_000001_create_base_schema",
            "m20240311_000001_extend_enum_values",
        ]
    }

    async fn up(&self, ctx: &StepContext<'_>) -> Result<(), StepError> {
        let admin = &ctx.seed.admin;

        if user::Entity::find_by_id(admin.id.clone()).one(ctx.db).await?.is_some() {
            debug!("管理员账号 {} 已存在", admin.id);
            return Ok(());
        }

        user::Entity::insert(user::ActiveModel {
            id: Set(admin.id.clone()),
            email: Set(admin.email.clone()),
            display_name: Set(admin.display_name.clone()),
            role: Set(UserRole::Admin),
            password_hash: Set(admin.password_hash.clone()),
            created_at: Set(now_string()),
        })
        .exec_without_returning(ctx.db)
        .await?;

        info!("已创建管理员账号 {}", admin.email);
        Ok(())
    }
}
