//! 数据库目录查询与幂等 DDL 辅助函数
//!
//! PostgreSQL 使用原生枚举类型；SQLite 没有枚举，列按 TEXT 存储，
//! 合法取值登记在 `enum_labels` 表中，检查方式与 `pg_enum` 一致。

use sea_orm::sea_query::extension::postgres::Type;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, DbBackend, Statement, Value};
use sea_orm_migration::prelude::*;
use tracing::{debug, info};

/// 允许迁移步骤创建或修改的枚举类型。枚举名只来自这里，不接受外部输入
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum DbEnum {
    UserRole,
    TicketStatus,
    TicketPriority,
    DocumentCategory,
}

impl DbEnum {
    pub fn name(self) -> &'static str {
        self.into()
    }
}

fn unsupported(backend: DbBackend) -> DbErr {
    DbErr::Custom(format!("不支持的数据库后端: {:?}", backend))
}

/// 枚举列：PostgreSQL 下使用对应的枚举类型，SQLite 下退化为字符串
pub fn enum_column<T: IntoIden>(backend: DbBackend, column: T, db_enum: DbEnum) -> ColumnDef {
    let mut def = ColumnDef::new(column);
    match backend {
        DbBackend::Postgres => def.custom(Alias::new(db_enum.name())),
        _ => def.string(),
    };
    def
}

/// 枚举类型是否已存在
pub async fn enum_exists(manager: &SchemaManager<'_>, db_enum: DbEnum) -> Result<bool, DbErr> {
    let backend = manager.get_database_backend();
    let stmt = match backend {
        DbBackend::Postgres => Statement::from_sql_and_values(
            backend,
            "SELECT 1 FROM pg_type WHERE typname = $1 LIMIT 1",
            [Value::from(db_enum.name())],
        ),
        DbBackend::Sqlite => {
            if !manager.has_table("enum_labels").await? {
                return Ok(false);
            }
            Statement::from_sql_and_values(
                backend,
                "SELECT 1 FROM enum_labels WHERE enum_name = ? LIMIT 1",
                [Value::from(db_enum.name())],
            )
        }
        other => return Err(unsupported(other)),
    };
    Ok(manager.get_connection().query_one(stmt).await?.is_some())
}

/// 枚举取值是否已存在
pub async fn enum_label_exists(manager: &SchemaManager<'_>, db_enum: DbEnum, label: &str) -> Result<bool, DbErr> {
    let backend = manager.get_database_backend();
    let stmt = match backend {
        DbBackend::Postgres => Statement::from_sql_and_values(
            backend,
            "SELECT 1 FROM pg_enum e JOIN pg_type t ON t.oid = e.enumtypid \
             WHERE t.typname = $1 AND e.enumlabel = $2 LIMIT 1",
            [Value::from(db_enum.name()), Value::from(label)],
        ),
        DbBackend::Sqlite => {
            if !manager.has_table("enum_labels").await? {
                return Ok(false);
            }
            Statement::from_sql_and_values(
                backend,
                "SELECT 1 FROM enum_labels WHERE enum_name = ? AND label = ? LIMIT 1",
                [Value::from(db_enum.name()), Value::from(label)],
            )
        }
        other => return Err(unsupported(other)),
    };
    Ok(manager.get_connection().query_one(stmt).await?.is_some())
}

/// 创建枚举类型（已存在则跳过）。已存在的类型不会补齐取值，补值走 [`add_enum_value`]
pub async fn ensure_enum(manager: &SchemaManager<'_>, db_enum: DbEnum, labels: &[&str]) -> Result<(), DbErr> {
    match manager.get_database_backend() {
        DbBackend::Postgres => {
            if enum_exists(manager, db_enum).await? {
                debug!("枚举类型 {} 已存在", db_enum.name());
                return Ok(());
            }
            manager
                .create_type(
                    Type::create()
                        .as_enum(Alias::new(db_enum.name()))
                        .values(labels.iter().map(|label| Alias::new(*label)))
                        .to_owned(),
                )
                .await?;
        }
        DbBackend::Sqlite => {
            if enum_exists(manager, db_enum).await? {
                debug!("枚举类型 {} 已存在", db_enum.name());
                return Ok(());
            }
            ensure_enum_label_table(manager).await?;
            for label in labels {
                insert_enum_label(manager, db_enum, label).await?;
            }
        }
        other => return Err(unsupported(other)),
    }
    info!("已创建枚举类型 {}", db_enum.name());
    Ok(())
}

/// 为枚举追加取值，先查目录再修改。返回是否真的新增了取值
///
/// PostgreSQL 的 `ALTER TYPE ... ADD VALUE` 不能放在事务里执行，也不要依赖
/// `IF NOT EXISTS`（旧版本不支持），所以这里总是先检查 `pg_enum`。
pub async fn add_enum_value(manager: &SchemaManager<'_>, db_enum: DbEnum, label: &str) -> Result<bool, DbErr> {
    if enum_label_exists(manager, db_enum, label).await? {
        return Ok(false);
    }
    match manager.get_database_backend() {
        DbBackend::Postgres => {
            manager
                .alter_type(
                    Type::alter()
                        .name(Alias::new(db_enum.name()))
                        .add_value(Alias::new(label))
                        .to_owned(),
                )
                .await?;
        }
        DbBackend::Sqlite => {
            ensure_enum_label_table(manager).await?;
            insert_enum_label(manager, db_enum, label).await?;
        }
        other => return Err(unsupported(other)),
    }
    info!("枚举 {} 新增取值 {}", db_enum.name(), label);
    Ok(true)
}

async fn ensure_enum_label_table(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    manager
        .create_table(
            Table::create()
                .table(EnumLabels::Table)
                .if_not_exists()
                .col(ColumnDef::new(EnumLabels::EnumName).string().not_null())
                .col(ColumnDef::new(EnumLabels::Label).string().not_null())
                .primary_key(Index::create().col(EnumLabels::EnumName).col(EnumLabels::Label))
                .to_owned(),
        )
        .await
}

async fn insert_enum_label(manager: &SchemaManager<'_>, db_enum: DbEnum, label: &str) -> Result<(), DbErr> {
    let stmt = Query::insert()
        .into_table(EnumLabels::Table)
        .columns([EnumLabels::EnumName, EnumLabels::Label])
        .values_panic([db_enum.name().into(), label.into()])
        .on_conflict(
            OnConflict::columns([EnumLabels::EnumName, EnumLabels::Label])
                .do_nothing()
                .to_owned(),
        )
        .to_owned();
    manager.exec_stmt(stmt).await
}

/// 仅在列不存在时添加列
pub async fn add_column_if_missing(
    manager: &SchemaManager<'_>,
    table: &str,
    column: &str,
    alter: TableAlterStatement,
) -> Result<bool, DbErr> {
    if manager.has_column(table, column).await? {
        debug!("{}.{} 字段已存在", table, column);
        return Ok(false);
    }
    manager.alter_table(alter).await?;
    info!("成功添加 {}.{} 字段", table, column);
    Ok(true)
}

#[derive(DeriveIden)]
enum EnumLabels {
    Table,
    EnumName,
    Label,
}
