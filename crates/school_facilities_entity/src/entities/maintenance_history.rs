use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "maintenance_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub school_id: String,
    pub category: String,
    pub description: Option<String>,
    #[sea_orm(column_type = "Double")]
    pub cost: f64,
    pub performed_on: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
