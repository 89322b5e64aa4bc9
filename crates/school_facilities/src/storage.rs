use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use regex::Regex;
use school_facilities_migration::BucketProvisioner;
use tracing::debug;

/// 本地目录实现的对象存储，每个存储桶对应根目录下的一个子目录
pub struct LocalBucketStore {
    root: PathBuf,
    name_pattern: Regex,
}

impl LocalBucketStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            // 与 S3 的存储桶命名规则保持一致
            name_pattern: Regex::new(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$")?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_path(&self, name: &str) -> Result<PathBuf> {
        if !self.name_pattern.is_match(name) || name.contains("..") {
            bail!("非法的存储桶名称: {}", name);
        }
        Ok(self.root.join(name))
    }
}

#[async_trait::async_trait]
impl BucketProvisioner for LocalBucketStore {
    async fn create_bucket_if_absent(&self, name: &str) -> Result<()> {
        let path = self.bucket_path(name)?;
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!("存储桶 {} 已存在", name);
            return Ok(());
        }
        tokio::fs::create_dir_all(&path)
            .await
            .with_context(|| format!("创建目录 {} 失败", path.display()))?;
        debug!("已创建存储桶 {}", name);
        Ok(())
    }
}
