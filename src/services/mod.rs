pub mod auth_service;
pub mod auth_service_impl;
pub mod tag_service;
pub mod tag_service_impl;
pub mod token;
