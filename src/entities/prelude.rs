pub use super::api_keys::Entity as ApiKeys;
pub use super::roles::Entity as Roles;
pub use super::tags::Entity as Tags;
pub use super::user_roles::Entity as UserRoles;
pub use super::user_tokens::Entity as UserTokens;
pub use super::users::Entity as Users;
