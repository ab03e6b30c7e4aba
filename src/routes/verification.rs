use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthService, Delivery};
use crate::cookies::CookiePolicy;
use crate::error::{AppError, ErrorContext};
use crate::routes::auth::session_response;

#[derive(Deserialize)]
pub struct VerifyEmailQuery {
    token: String,
}

#[derive(Deserialize)]
pub struct ResendRequest {
    pub username: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ResendResponse {
    pub success: bool,
    pub already_verified: bool,
}

/// GET /auth/verify-email?token=...
///
/// Verifies the account and signs it in.
///
/// # Errors
/// - 400: TOKEN_NOT_FOUND, TOKEN_EXPIRED
/// - 403: DEACTIVATED
pub async fn verify_email(
    query: web::Query<VerifyEmailQuery>,
    service: web::Data<AuthService>,
    policy: web::Data<CookiePolicy>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("email_verification");

    let session = service.redeem_verification(&query.token).await.map_err(|e| {
        context.log_error(&e);
        e
    })?;

    Ok(session_response(policy.get_ref(), &session.account, session.tokens))
}

/// POST /auth/resend-verification
///
/// Replaces any pending token, so only the newest link works.
pub async fn resend_verification(
    form: web::Json<ResendRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    match service.resend_verification(&form.username).await? {
        Delivery::Sent => Ok(HttpResponse::Ok().json(ResendResponse {
            success: true,
            already_verified: false,
        })),
        Delivery::AlreadyVerified => Ok(HttpResponse::Ok().json(ResendResponse {
            success: true,
            already_verified: true,
        })),
        Delivery::Failed(e) => Err(AppError::Email(e)),
    }
}
