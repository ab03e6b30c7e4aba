/// Middleware module
///
/// Authentication middleware and the role guards built on its claims.

mod authorization;
mod jwt_middleware;

pub use authorization::{require_owner_or_admin, require_role};
pub use jwt_middleware::JwtMiddleware;
