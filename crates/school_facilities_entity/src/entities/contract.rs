use sea_orm::entity::prelude::*;

/// 维保/服务合同
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "contracts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub school_id: String,
    pub name: String,
    pub vendor: Option<String>,
    /// 格式 YYYY-MM-DD
    pub start_date: String,
    pub end_date: Option<String>,
    /// 复检/续约周期（年），为空表示一次性合同
    pub recurrence_interval_years: Option<i32>,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::contract_year::Entity")]
    ContractYear,
}

impl Related<super::contract_year::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContractYear.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
