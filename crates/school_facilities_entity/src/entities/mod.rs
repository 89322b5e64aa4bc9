pub mod prelude;

pub mod board;
pub mod budget_category;
pub mod contract;
pub mod contract_year;
pub mod maintenance_history;
pub mod migration_record;
pub mod school;
pub mod sea_orm_active_enums;
pub mod user;
pub mod user_school;
