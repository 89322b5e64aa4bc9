use std::collections::HashSet;

use sea_orm::DatabaseConnection;
use sea_orm_migration::prelude::*;
use tracing::{debug, error, info, warn};

use crate::error::{MigrationError, StepError};
use crate::seed::SeedData;
use crate::tracking::TrackingStore;

/// 步骤类型：结构变更必须全部排在数据步骤之前
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// 幂等 DDL
    Schema,
    /// 写入固定的参考数据
    Seed,
    /// 回填/修复已有数据
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criticality {
    /// 失败即中止启动
    Critical,
    /// 失败只记录日志，继续执行后续步骤
    NonCritical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tracking {
    /// 依赖 `app_migrations` 记录，执行成功后写入记录，之后跳过
    Tracked,
    /// 每次启动都检查真实数据状态，不查询也不写入迁移记录
    SelfIdempotent,
}

/// 对象存储能力，仅供创建学校存储桶的步骤使用
#[async_trait::async_trait]
pub trait BucketProvisioner: Send + Sync {
    /// 存储桶不存在时创建，已存在时直接返回成功
    async fn create_bucket_if_absent(&self, name: &str) -> anyhow::Result<()>;
}

/// 传递给每个步骤的上下文，启动时构造一次
pub struct StepContext<'a> {
    pub db: &'a DatabaseConnection,
    pub seed: &'a SeedData,
    pub buckets: &'a dyn BucketProvisioner,
}

impl<'a> StepContext<'a> {
    pub fn new(db: &'a DatabaseConnection, seed: &'a SeedData, buckets: &'a dyn BucketProvisioner) -> Self {
        Self { db, seed, buckets }
    }

    pub fn schema_manager(&self) -> SchemaManager<'a> {
        SchemaManager::new(self.db)
    }
}

/// 一个迁移步骤。名称一经发布不可复用，它同时是迁移记录表中的主键
#[async_trait::async_trait]
pub trait StepTrait: MigrationName + Send + Sync {
    fn kind(&self) -> StepKind;

    fn criticality(&self) -> Criticality;

    fn tracking(&self) -> Tracking;

    /// 必须排在本步骤之前的步骤名称
    fn requires(&self) -> &'static [&'static str] {
        &[]
    }

    async fn up(&self, ctx: &StepContext<'_>) -> Result<(), StepError>;
}

/// 单个步骤的执行状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepState {
    NotAttempted,
    Running,
    Completed,
    /// 已有迁移记录，未执行
    Skipped,
    Failed(String),
}

/// 一次执行的结果，按声明顺序保存每个步骤的最终状态
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    steps: Vec<(String, StepState)>,
}

impl MigrationReport {
    fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            steps: names
                .into_iter()
                .map(|name| (name.to_string(), StepState::NotAttempted))
                .collect(),
        }
    }

    fn set(&mut self, index: usize, state: StepState) {
        if let Some(entry) = self.steps.get_mut(index) {
            entry.1 = state;
        }
    }

    pub fn steps(&self) -> &[(String, StepState)] {
        &self.steps
    }

    pub fn state(&self, name: &str) -> Option<&StepState> {
        self.steps.iter().find(|(n, _)| n == name).map(|(_, state)| state)
    }

    pub fn failed(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|(_, state)| matches!(state, StepState::Failed(_)))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn count(&self, wanted: &StepState) -> usize {
        self.steps.iter().filter(|(_, state)| state == wanted).count()
    }
}

enum Outcome {
    Completed,
    Skipped,
}

/// 启动迁移执行器：按固定顺序逐个执行步骤，不做并发
pub struct Migrator {
    steps: Vec<Box<dyn StepTrait>>,
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new(crate::steps())
    }
}

impl Migrator {
    pub fn new(steps: Vec<Box<dyn StepTrait>>) -> Self {
        Self { steps }
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// 检查执行顺序：名称唯一、依赖在前、结构变更先于数据步骤
    pub fn validate(&self) -> Result<(), MigrationError> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut data_step: Option<&str> = None;

        for step in &self.steps {
            let name = step.name();
            if name.is_empty() {
                return Err(MigrationError::InvalidPlan("存在未命名的迁移步骤".to_string()));
            }
            if seen.contains(name) {
                return Err(MigrationError::InvalidPlan(format!("迁移步骤名称重复: {}", name)));
            }
            for required in step.requires() {
                if !seen.contains(required) {
                    return Err(MigrationError::InvalidPlan(format!(
                        "{} 依赖的步骤 {} 必须排在它之前",
                        name, required
                    )));
                }
            }
            match step.kind() {
                StepKind::Schema => {
                    if let Some(data_step) = data_step {
                        return Err(MigrationError::InvalidPlan(format!(
                            "结构变更 {} 不能排在数据步骤 {} 之后",
                            name, data_step
                        )));
                    }
                }
                StepKind::Seed | StepKind::Data => {
                    data_step.get_or_insert(name);
                }
            }
            seen.insert(name);
        }
        Ok(())
    }

    /// 执行全部步骤。只有关键步骤失败（或迁移记录表无法创建）时返回错误
    pub async fn run(&self, ctx: &StepContext<'_>) -> Result<MigrationReport, MigrationError> {
        self.validate()?;

        let tracking = TrackingStore::new(ctx.db);
        tracking.ensure_table().await.map_err(MigrationError::TrackingTable)?;

        let mut report = MigrationReport::new(self.step_names());
        info!("开始执行数据库迁移，共 {} 个步骤", self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let name = step.name();
            report.set(index, StepState::Running);

            match self.run_step(step.as_ref(), &tracking, ctx).await {
                Ok(Outcome::Completed) => {
                    info!(step = name, "迁移步骤完成");
                    report.set(index, StepState::Completed);
                }
                Ok(Outcome::Skipped) => {
                    debug!(step = name, "迁移步骤已执行过，跳过");
                    report.set(index, StepState::Skipped);
                }
                Err(e) => {
                    report.set(index, StepState::Failed(e.to_string()));
                    match step.criticality() {
                        Criticality::Critical => {
                            error!(step = name, "关键迁移步骤失败，中止启动: {}", e);
                            return Err(MigrationError::CriticalStep {
                                step: name.to_string(),
                                source: e,
                            });
                        }
                        Criticality::NonCritical => {
                            error!(step = name, "迁移步骤失败，继续执行后续步骤: {}", e);
                        }
                    }
                }
            }
        }

        let failed = report.failed();
        if failed.is_empty() {
            info!("数据库迁移完成");
        } else {
            warn!("数据库迁移完成，{} 个非关键步骤失败: {}", failed.len(), failed.join(", "));
        }
        Ok(report)
    }

    async fn run_step(
        &self,
        step: &dyn StepTrait,
        tracking: &TrackingStore<'_, DatabaseConnection>,
        ctx: &StepContext<'_>,
    ) -> Result<Outcome, StepError> {
        let name = step.name();
        let tracked = step.tracking() == Tracking::Tracked;

        if tracked && tracking.has_run(name).await {
            return Ok(Outcome::Skipped);
        }

        debug!(step = name, "执行迁移步骤");
        step.up(ctx).await?;

        if tracked {
            tracking.mark_complete(name).await.map_err(StepError::MarkComplete)?;
        }
        Ok(Outcome::Completed)
    }
}
