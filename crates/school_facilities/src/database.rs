use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use school_facilities_migration::{
    BucketProvisioner, MigrationError, MigrationReport, Migrator, SeedData, StepContext, StepError, StepState,
};
use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlxSqliteConnector};
use tracing::{debug, info, warn};

fn is_sqlite(url: &str) -> bool {
    url.starts_with("sqlite:")
}

/// SQLite 连接选项，迁移连接与服务连接共用
fn create_sqlite_options(url: &str) -> Result<SqliteConnectOptions> {
    Ok(SqliteConnectOptions::from_str(url)
        .with_context(|| format!("无效的 SQLite 地址: {}", url))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30))
        .pragma("temp_store", "MEMORY"))
}

async fn connect(url: &str, max_connections: u32) -> Result<DatabaseConnection> {
    if is_sqlite(url) {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(create_sqlite_options(url)?)
            .await
            .context("连接 SQLite 数据库失败")?;
        return Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool));
    }

    let mut opt = ConnectOptions::new(url);
    opt.max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(false);
    Database::connect(opt).await.context("连接数据库失败")
}

/// 服务使用的连接池
pub async fn database_connection(url: &str) -> Result<DatabaseConnection> {
    let connection = connect(url, 10).await?;
    debug!("数据库连接池已创建");
    Ok(connection)
}

/// 在单连接池上执行启动迁移，结束后关闭连接池释放锁。
/// 只有关键步骤失败时返回错误
pub async fn migrate_database(
    url: &str,
    seed: &SeedData,
    buckets: &dyn BucketProvisioner,
) -> Result<MigrationReport> {
    // 单连接保证 DDL 严格按顺序执行
    let connection = connect(url, 1).await?;
    let ctx = StepContext::new(&connection, seed, buckets);
    let result = Migrator::default().run(&ctx).await;
    let closed = connection.close().await;

    let report = finish_migration(result, closed)?;
    debug!("迁移完成，已关闭迁移连接池");
    info!(
        "迁移结果：完成 {} 个，跳过 {} 个，失败 {} 个",
        report.count(&StepState::Completed),
        report.count(&StepState::Skipped),
        report.failed().len()
    );
    Ok(report)
}

/// 迁移失败时优先返回迁移错误，关闭连接的错误只记录日志
fn finish_migration(
    result: Result<MigrationReport, MigrationError>,
    closed: Result<(), DbErr>,
) -> Result<MigrationReport> {
    match (result, closed) {
        (Ok(report), Ok(())) => Ok(report),
        (Ok(_), Err(e)) => Err(e).context("关闭迁移连接失败"),
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                warn!("关闭迁移连接失败: {}", close_err);
            }
            Err(e).context("数据库迁移失败")
        }
    }
}
