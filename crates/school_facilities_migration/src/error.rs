use sea_orm_migration::prelude::DbErr;
use thiserror::Error;

/// 迁移执行器整体失败：只有这些错误会阻止服务启动
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("迁移计划无效: {0}")]
    InvalidPlan(String),

    #[error("创建迁移记录表失败: {0}")]
    TrackingTable(#[source] DbErr),

    #[error("关键迁移步骤 {step} 失败: {source}")]
    CriticalStep {
        step: String,
        #[source]
        source: StepError,
    },
}

/// 单个迁移步骤的失败原因
#[derive(Error, Debug)]
pub enum StepError {
    #[error("数据库操作失败: {0}")]
    Db(#[from] DbErr),

    #[error("写入迁移记录失败: {0}")]
    MarkComplete(#[source] DbErr),

    #[error("创建存储桶 {bucket} 失败: {source}")]
    Storage {
        bucket: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{0}")]
    Data(String),
}

/// 种子数据配置不合法
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SeedError {
    #[error("重复的 ID: {0}")]
    DuplicateId(String),

    #[error("学校 {school} 引用了不存在的董事会 {board}")]
    UnknownBoard { school: String, board: String },

    #[error("默认学校 {0} 不在种子数据中")]
    UnknownDefaultSchool(String),

    #[error("管理员 ID 不能为空")]
    EmptyAdminId,
}
