use sea_orm::entity::prelude::*;

/// 学校，绝大多数业务数据的租户范围
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "schools")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub board_id: Option<String>,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::board::Entity",
        from = "Column::BoardId",
        to = "super::board::Column::Id"
    )]
    Board,
    #[sea_orm(has_many = "super::user_school::Entity")]
    UserSchool,
}

impl Related<super::board::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Board.def()
    }
}

impl Related<super::user_school::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserSchool.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
