use sea_orm::entity::prelude::*;

use super::sea_orm_active_enums::UserRole;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    pub password_hash: Option<String>,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_school::Entity")]
    UserSchool,
}

impl Related<super::user_school::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserSchool.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
