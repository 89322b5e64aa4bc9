use std::collections::BTreeMap;

use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait};
use sea_orm_migration::prelude::*;
use tracing::{debug, info};

use school_facilities_entity::{school, user, user_school};

use crate::error::StepError;
use crate::migrator::{Criticality, StepContext, StepKind, StepTrait, Tracking};
use crate::tracking::now_string;

/// 单条 INSERT 最多写入的关联数
const INSERT_BATCH_SIZE: usize = 500;

/// 保证每个用户至少关联一所学校，且恰好有一所默认学校
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
        &[
            "m20240311_000002_add_multi_tenant_columns",
            "m20240312_000001_seed_reference_data",
        ]
    }

    async fn up(&self, ctx: &StepContext<'_>) -> Result<(), StepError> {
        let txn = ctx.db.begin().await?;

        let user_ids: Vec<String> = user::Entity::find()
            .select_only()
            .column(user::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;
        let links = user_school::Entity::find().all(&txn).await?;

        let plan = plan_default_links(&user_ids, &links);
        if plan.is_empty() {
            debug!("所有用户均已关联默认学校");
            txn.rollback().await?;
            return Ok(());
        }

        if !plan.insert.is_empty() {
            let default_school = resolve_default_school(&txn, ctx.seed.default_school_id.as_deref()).await?;
            let created_at = now_string();
            // 绑定参数个数有上限（SQLite 32766，PostgreSQL 65535），大批用户需要分批写入
            for batch in plan.insert.chunks(INSERT_BATCH_SIZE) {
                let models = batch.iter().map(|user_id| user_school::ActiveModel {
                    user_id: Set(user_id.clone()),
                    school_id: Set(default_school.clone()),
                    is_default: Set(true),
                    created_at: Set(created_at.clone()),
                });
                user_school::Entity::insert_many(models)
                    .on_conflict(
                        OnConflict::columns([user_school::Column::UserId, user_school::Column::SchoolId])
                            .do_nothing()
                            .to_owned(),
                    )
                    .exec_without_returning(&txn)
                    .await?;
            }
        }

        for (user_id, school_id) in &plan.set_default {
            set_default_flag(&txn, user_id, school_id, true).await?;
        }
        for (user_id, school_id) in &plan.clear_default {
            set_default_flag(&txn, user_id, school_id, false).await?;
        }

        txn.commit().await?;
        info!(
            "用户学校关联已修复：新增 {} 条，设为默认 {} 条，取消默认 {} 条",
            plan.insert.len(),
            plan.set_default.len(),
            plan.clear_default.len()
        );
        Ok(())
    }
}

/// 配置的默认学校存在时使用它，否则取 ID 最小的学校
async fn resolve_default_school<C: sea_orm::ConnectionTrait>(
    db: &C,
    configured: Option<&str>,
) -> Result<String, StepError> {
    if let Some(id) = configured {
        if school::Entity::find_by_id(id.to_owned()).one(db).await?.is_some() {
            return Ok(id.to_owned());
        }
        debug!("配置的默认学校 {} 不存在，改用 ID 最小的学校", id);
    }

    school::Entity::find()
        .order_by_asc(school::Column::Id)
        .one(db)
        .await?
        .map(|s| s.id)
        .ok_or_else(|| StepError::Data("没有可分配的学校".to_string()))
}

async fn set_default_flag<C: sea_orm::ConnectionTrait>(
    db: &C,
    user_id: &str,
    school_id: &str,
    is_default: bool,
) -> Result<(), StepError> {
    user_school::Entity::update_many()
        .col_expr(user_school::Column::IsDefault, Expr::value(is_default))
        .filter(user_school::Column::UserId.eq(user_id))
        .filter(user_school::Column::SchoolId.eq(school_id))
        .exec(db)
        .await?;
    Ok(())
}

/// 需要执行的关联修复
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LinkPlan {
    /// 没有任何关联、需要关联到默认学校的用户
    pub insert: Vec<String>,
    /// (user_id, school_id)
    pub set_default: Vec<(String, String)>,
    /// (user_id, school_id)
    pub clear_default: Vec<(String, String)>,
}

impl LinkPlan {
    pub fn is_empty(&self) -> bool {
        self.insert.is_empty() && self.set_default.is_empty() && self.clear_default.is_empty()
    }
}

/// 计算关联修复方案。多个候选时总是保留学校 ID 最小的那一条
pub fn plan_default_links(user_ids: &[String], links: &[user_school::Model]) -> LinkPlan {
    let mut by_user: BTreeMap<&str, Vec<&user_school::Model>> = BTreeMap::new();
    for link in links {
        by_user.entry(link.user_id.as_str()).or_default().push(link);
    }

    let mut plan = LinkPlan::default();
    for user_id in user_ids {
        let Some(user_links) = by_user.get_mut(user_id.as_str()) else {
            plan.insert.push(user_id.clone());
            continue;
        };
        user_links.sort_by(|a, b| a.school_id.cmp(&b.school_id));

        let defaults: Vec<&&user_school::Model> = user_links.iter().filter(|l| l.is_default).collect();
        match defaults.as_slice() {
            [] => plan
                .set_default
                .push((user_id.clone(), user_links[0].school_id.clone())),
            [_] => {}
            [_, rest @ ..] => {
                for link in rest {
                    plan.clear_default.push((user_id.clone(), link.school_id.clone()));
                }
            }
        }
    }
    plan
}
