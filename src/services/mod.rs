//! Business services

pub mod auth_service;
pub mod identity_service;

pub use auth_service::AuthService;
pub use identity_service::IdentityService;
