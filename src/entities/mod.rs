pub mod prelude;

pub mod api_keys;
pub mod roles;
pub mod tags;
pub mod user_roles;
pub mod user_tokens;
pub mod users;
