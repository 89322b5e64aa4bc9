mod api;
mod config;
mod database;
mod storage;
mod utils;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use crate::config::{AppConfig, Args, Command};
use crate::storage::LocalBucketStore;
use crate::utils::init_logger;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level)?;

    let config = AppConfig::from_args(args)?;
    let buckets = LocalBucketStore::new(&config.storage_dir)?;
    info!("存储目录: {}", buckets.root().display());

    // 迁移必须在监听端口之前完成，关键步骤失败直接退出
    let report = database::migrate_database(&config.database_url, &config.seed, &buckets).await?;
    if !report.failed().is_empty() {
        warn!("部分非关键迁移步骤失败，将在下次启动时重试");
    }

    if config.command == Command::Migrate {
        info!("迁移已完成，退出");
        return Ok(());
    }

    let connection = database::database_connection(&config.database_url).await?;
    api::serve(config.bind, connection).await
}
