pub use super::board::Entity as Board;
pub use super::budget_category::Entity as BudgetCategory;
pub use super::contract::Entity as Contract;
pub use super::contract_year::Entity as ContractYear;
pub use super::maintenance_history::Entity as MaintenanceHistory;
pub use super::migration_record::Entity as MigrationRecord;
pub use super::school::Entity as School;
pub use super::user::Entity as User;
pub use super::user_school::Entity as UserSchool;
