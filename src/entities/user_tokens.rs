use sea_orm::entity::prelude::*;

/// One row per issued token. Rows are deleted on sign-out, rotation,
/// and by the expired-token sweep; a cryptographically valid JWT with
/// no matching row is treated as revoked.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    /// Token kind: "ACCESS" or "REFRESH"
    pub kind: String,

    #[sea_orm(column_type = "Text")]
    pub token: String,

    pub expired_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
