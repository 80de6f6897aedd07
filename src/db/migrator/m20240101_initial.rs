use crate::entities::prelude::*;
use crate::entities::{api_keys, roles, user_roles, user_tokens, users};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Default API key (rotate in production)
const DEFAULT_API_KEY: &str = "dapur_default_api_key_please_rotate";

const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
const DEFAULT_ADMIN_PASSWORD: &str = "qwerty12345";

/// Hash the default admin password using Argon2id
fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(DEFAULT_ADMIN_PASSWORD.as_bytes(), &salt)
        .expect("Failed to hash default password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Roles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(UserRoles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(UserTokens)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ApiKeys)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Tags)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // A user holds each role at most once.
        manager
            .create_index(
                Index::create()
                    .name("idx_user_roles_user_role")
                    .table(UserRoles)
                    .col(user_roles::Column::UserId)
                    .col(user_roles::Column::RoleId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Token rows are addressed by (user, kind, token) everywhere.
        manager
            .create_index(
                Index::create()
                    .name("idx_user_tokens_user_kind_token")
                    .table(UserTokens)
                    .col(user_tokens::Column::UserId)
                    .col(user_tokens::Column::Kind)
                    .col(user_tokens::Column::Token)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        seed(manager).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tags).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApiKeys).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserTokens).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserRoles).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}

/// Seed the base roles, a default admin account, and an ACTIVE api key
/// so the service is usable out of the box.
async fn seed(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    let db = manager.get_connection();
    let now = chrono::Utc::now().to_rfc3339();

    let admin_role = roles::ActiveModel {
        name: Set("ADMIN".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    roles::ActiveModel {
        name: Set("USER".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let admin = users::ActiveModel {
        name: Set("Admin".to_string()),
        email: Set(DEFAULT_ADMIN_EMAIL.to_string()),
        password_hash: Set(hash_default_password()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    UserRoles::insert(user_roles::ActiveModel {
        user_id: Set(admin.id),
        role_id: Set(admin_role.id),
        ..Default::default()
    })
    .exec(db)
    .await?;

    ApiKeys::insert(api_keys::ActiveModel {
        user_id: Set(admin.id),
        key: Set(DEFAULT_API_KEY.to_string()),
        status: Set("ACTIVE".to_string()),
        ..Default::default()
    })
    .exec(db)
    .await?;

    Ok(())
}
