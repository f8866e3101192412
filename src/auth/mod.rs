//! Authentication and authorization module

pub mod cache;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use cache::IdentityCache;
pub use jwt::{Claims, JwtService};
pub use middleware::{extract_token, jwt_auth_middleware, AuthContext};
pub use password::PasswordHasher;
