use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    pub slug: String,

    /// Denormalized usage counters maintained by the wider platform;
    /// this service only reads and sorts by them.
    pub meals_count: i32,

    pub drinks_count: i32,

    pub created_by: Option<i32>,

    pub updated_by: Option<i32>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
