pub use sea_orm_migration::sea_orm;

mod catalog;
mod error;
mod migrator;
mod seed;
mod tracking;

mod m20240108_000001_create_base_schema;
mod m20240108_000002_create_session_table;
mod m20240311_000001_extend_enum_values;
mod m20240311_000002_add_multi_tenant_columns;
mod m20240312_000001_seed_reference_data;
mod m20240312_000002_seed_admin_user;
mod m20240312_000003_assign_users_to_schools;
mod m20240520_000001_add_budget_and_contract_columns;
mod m20240601_000001_provision_school_buckets;
mod m20240715_000001_recalculate_budget_spent;
mod m20240902_000001_backfill_contract_years;

#[cfg(test)]
mod tests;

pub use catalog::DbEnum;
pub use error::{MigrationError, SeedError, StepError};
pub use migrator::{
    BucketProvisioner, Criticality, MigrationReport, Migrator, StepContext, StepKind, StepState, StepTrait, Tracking,
};
pub use seed::{AdminSeed, BoardSeed, SchoolSeed, SeedData};
pub use tracking::TrackingStore;

/// 启动时执行的全部步骤，顺序固定：结构变更在前，种子数据其次，数据修复最后。
/// 新步骤只能追加，已发布的名称不能改动
pub fn steps() -> Vec<Box<dyn StepTrait>> {
    vec![
        Box::new(m20240108_000001_create_base_schema::Migration),
        Box::new(m20240108_000002_create_session_table::Migration),
        Box::new(m20240311_000001_extend_enum_values::Migration),
        Box::new(m20240311_000002_add_multi_tenant_columns::Migration),
        // 执行顺序以这里为准，与名称中的日期无关
        Box::new(m20240520_000001_add_budget_and_contract_columns::Migration),
        Box::new(m20240312_000001_seed_reference_data::Migration),
        Box::new(m20240312_000002_seed_admin_user::Migration),
        Box::new(m20240312_000003_assign_users_to_schools::Migration),
        Box::new(m20240601_000001_provision_school_buckets::Migration),
        Box::new(m20240715_000001_recalculate_budget_spent::Migration),
        Box::new(m20240902_000001_backfill_contract_years::Migration),
    ]
}
