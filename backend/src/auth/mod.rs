//! Authentication module
//!
//! Bearer JWTs identify the user behind tracking requests. Job endpoints
//! use a shared secret instead, see `routes::jobs`.

mod jwt;
mod middleware;

pub use jwt::{Claims, JwtService};
pub use middleware::AuthUser;
