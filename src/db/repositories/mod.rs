pub mod api_key;
pub mod tag;
pub mod token;
pub mod user;
