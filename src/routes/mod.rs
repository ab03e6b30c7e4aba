use actix_web::HttpResponse;

pub mod auth;
pub mod verification;

pub use auth::{admin, login, logout, me, refresh_token, register, verify};
pub use verification::{resend_verification, verify_email};

/// GET /health_check
///
/// Liveness only; does not touch the credential store.
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().finish()
}
