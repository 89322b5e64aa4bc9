use sea_orm::entity::prelude::*;

/// 预算类目，`spent` 是由维修记录汇总得到的冗余字段
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budget_categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub school_id: String,
    pub name: String,
    pub year: i32,
    #[sea_orm(column_type = "Double")]
    pub budget: f64,
    #[sea_orm(column_type = "Double")]
    pub spent: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
