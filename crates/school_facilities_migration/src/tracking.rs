use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, EntityTrait, QueryOrder, Set};
use sea_orm_migration::prelude::*;
use tracing::{debug, warn};

use school_facilities_entity::migration_record;

/// 迁移记录表 `app_migrations`，记录已完成的迁移步骤名称
pub struct TrackingStore<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> TrackingStore<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// 确保迁移记录表存在，失败时必须中止启动
    pub async fn ensure_table(&self) -> Result<(), DbErr> {
        let backend = self.db.get_database_backend();
        let stmt = Table::create()
            .table(AppMigrations::Table)
            .if_not_exists()
            .col(ColumnDef::new(AppMigrations::Name).string().not_null().primary_key())
            .col(ColumnDef::new(AppMigrations::ExecutedAt).string().not_null())
            .to_owned();
        self.db.execute(backend.build(&stmt)).await?;
        Ok(())
    }

    /// 查询步骤是否已执行。查询出错时按“未执行”处理，宁可重跑也不跳过
    pub async fn has_run(&self, name: &str) -> bool {
        match migration_record::Entity::find_by_id(name.to_owned()).one(self.db).await {
            Ok(record) => record.is_some(),
            Err(e) => {
                warn!(step = name, "查询迁移记录失败，按未执行处理: {}", e);
                false
            }
        }
    }

    /// 标记步骤已完成；写入失败会作为步骤失败向上传递
    pub async fn mark_complete(&self, name: &str) -> Result<(), DbErr> {
        let record = migration_record::ActiveModel {
            name: Set(name.to_owned()),
            executed_at: Set(now_string()),
        };
        migration_record::Entity::insert(record)
            .on_conflict(
                OnConflict::column(migration_record::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db)
            .await?;
        debug!(step = name, "已写入迁移记录");
        Ok(())
    }

    /// 按执行时间列出全部迁移记录
    pub async fn records(&self) -> Result<Vec<migration_record::Model>, DbErr> {
        migration_record::Entity::find()
            .order_by_asc(migration_record::Column::ExecutedAt)
            .order_by_asc(migration_record::Column::Name)
            .all(self.db)
            .await
    }
}

/// 精确到微秒，同一秒内写入的记录仍能按执行顺序排序
pub(crate) fn now_string() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

#[derive(DeriveIden)]
enum AppMigrations {
    Table,
    Name,
    ExecutedAt,
}
