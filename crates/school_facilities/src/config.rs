use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use school_facilities_migration::SeedData;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "school-facilities", version, about)]
pub struct Args {
    /// 数据库连接地址，支持 sqlite:// 与 postgres://，默认使用配置目录下的 SQLite 文件
    #[arg(long, env = "SCHOOL_FACILITIES_DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "SCHOOL_FACILITIES_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// 学校存储桶所在目录
    #[arg(long, env = "SCHOOL_FACILITIES_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    /// 覆盖内置种子数据的 JSON 文件
    #[arg(long, env = "SCHOOL_FACILITIES_SEED_FILE")]
    pub seed_file: Option<PathBuf>,

    #[arg(long, env = "SCHOOL_FACILITIES_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    /// 执行迁移后启动 HTTP 服务
    #[default]
    Serve,
    /// 只执行迁移，完成后退出
    Migrate,
}

/// 启动时由命令行参数构建一次，之后只读
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind: SocketAddr,
    pub storage_dir: PathBuf,
    pub seed: SeedData,
    pub command: Command,
}

impl AppConfig {
    pub fn from_args(args: Args) -> Result<Self> {
        let database_url = match args.database_url {
            Some(url) => url,
            None => default_database_url()?,
        };
        let storage_dir = match args.storage_dir {
            Some(dir) => dir,
            None => app_dir()?.join("storage"),
        };
        let seed = match &args.seed_file {
            Some(path) => load_seed(path)?,
            None => SeedData::default(),
        };

        Ok(Self {
            database_url,
            bind: args.bind,
            storage_dir,
            seed,
            command: args.command.unwrap_or_default(),
        })
    }
}

fn app_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("school-facilities"))
        .context("无法确定配置目录，请通过参数显式指定路径")
}

fn default_database_url() -> Result<String> {
    let dir = app_dir()?;
    if !dir.exists() {
        std::fs::create_dir_all(&dir).with_context(|| format!("创建配置目录 {} 失败", dir.display()))?;
    }
    Ok(format!("sqlite://{}", dir.join("data.sqlite").display()))
}

/// 读取种子数据文件，未出现的字段使用内置默认值
pub fn load_seed(path: &Path) -> Result<SeedData> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("读取种子数据文件 {} 失败", path.display()))?;
    let seed: SeedData =
        serde_json::from_str(&content).with_context(|| format!("解析种子数据文件 {} 失败", path.display()))?;
    seed.validate()
        .with_context(|| format!("种子数据文件 {} 无效", path.display()))?;
    debug!("已加载种子数据文件 {}", path.display());
    Ok(seed)
}
