/// Authentication Routes
///
/// Registration, login, token refresh, logout, and the authenticated
/// account views. Session tokens travel as cookies; see `crate::cookies`.

use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

use crate::account::{Account, Role};
use crate::auth::{AccessClaims, AuthService, SessionTokens};
use crate::cookies::{refresh_token_from, CookiePolicy};
use crate::error::{AppError, ErrorContext};
use crate::middleware::require_role;

/// Account registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public view of an account; never includes hashes or tokens
#[derive(Serialize, Deserialize, Debug)]
pub struct AccountResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: String,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            username: account.username.clone(),
            email: account.email.clone(),
            role: account.role,
            is_verified: account.is_verified,
            is_active: account.is_active,
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub success: bool,
    pub account: AccountResponse,
    pub verification_email_sent: bool,
}

/// Returned by login and email verification alongside the session cookies
#[derive(Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub success: bool,
    pub account: AccountResponse,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RefreshResponse {
    pub success: bool,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ClaimsResponse {
    pub success: bool,
    pub claims: AccessClaims,
}

/// Sets both session cookies and returns the session body
pub(crate) fn session_response(
    policy: &CookiePolicy,
    account: &Account,
    tokens: SessionTokens,
) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(policy.access_cookie(&tokens.access_token, tokens.access_expires_in))
        .cookie(policy.refresh_cookie(&tokens.refresh_token, tokens.refresh_expires_in))
        .json(SessionResponse {
            success: true,
            account: AccountResponse::from(account),
            access_token: tokens.access_token,
            token_type: "Bearer".to_string(),
            expires_in: tokens.access_expires_in,
        })
}

/// POST /auth/register
///
/// Creates an unverified member account and emails a verification link.
/// No session is issued until the email is verified.
///
/// # Errors
/// - 400: Validation errors (username/email/password)
/// - 409: Username or email already registered
/// - 500: Internal server error
pub async fn register(
    form: web::Json<RegisterRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("account_registration");

    let registration = service
        .register(&form.username, &form.email, &form.password)
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    tracing::info!(
        request_id = %context.request_id,
        account_id = %registration.account.id,
        "Registration completed"
    );

    Ok(HttpResponse::Created().json(RegisterResponse {
        success: true,
        account: AccountResponse::from(&registration.account),
        verification_email_sent: registration.delivery.is_sent(),
    }))
}

/// POST /auth/login
///
/// # Errors
/// - 404: NOT_FOUND
/// - 403: NOT_VERIFIED, DEACTIVATED
/// - 401: BAD_CREDENTIAL
pub async fn login(
    form: web::Json<LoginRequest>,
    service: web::Data<AuthService>,
    policy: web::Data<CookiePolicy>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("account_login");

    let session = service
        .login(&form.username, &form.password)
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    Ok(session_response(policy.get_ref(), &session.account, session.tokens))
}

/// POST /auth/refresh-token
///
/// Reads the `refreshToken` cookie and returns a new access token. Any auth
/// failure also clears both cookies so the client stops presenting them.
pub async fn refresh_token(
    req: HttpRequest,
    service: web::Data<AuthService>,
    policy: web::Data<CookiePolicy>,
) -> HttpResponse {
    let presented = refresh_token_from(&req);

    match service.refresh(presented.as_deref()).await {
        Ok(refreshed) => HttpResponse::Ok()
            .cookie(policy.access_cookie(&refreshed.access_token, refreshed.expires_in))
            .json(RefreshResponse {
                success: true,
                access_token: refreshed.access_token,
                token_type: "Bearer".to_string(),
                expires_in: refreshed.expires_in,
            }),
        Err(e) => {
            let mut response = e.error_response();
            if e.auth_kind().is_some() {
                for cookie in policy.removal_cookies() {
                    if let Err(err) = response.add_cookie(&cookie) {
                        tracing::error!(error = %err, "Failed to clear session cookie");
                    }
                }
            }
            response
        }
    }
}

/// POST /auth/logout
///
/// Revokes the refresh token and clears both cookies. Access tokens already
/// handed out stay valid until they expire.
pub async fn logout(
    claims: web::ReqData<AccessClaims>,
    service: web::Data<AuthService>,
    policy: web::Data<CookiePolicy>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("account_logout").with_account_id(claims.sub.clone());

    let account_id = claims.account_id()?;
    service.logout(account_id).await.map_err(|e| {
        context.log_error(&e);
        e
    })?;

    let [access, refresh] = policy.removal_cookies();
    Ok(HttpResponse::Ok()
        .cookie(access)
        .cookie(refresh)
        .json(serde_json::json!({
            "success": true,
            "message": "Logged out"
        })))
}

/// GET /auth/verify
///
/// Echoes the decoded access-token claims
pub async fn verify(claims: web::ReqData<AccessClaims>) -> HttpResponse {
    HttpResponse::Ok().json(ClaimsResponse {
        success: true,
        claims: claims.into_inner(),
    })
}

/// GET /auth/me
pub async fn me(
    claims: web::ReqData<AccessClaims>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let account = service.current_account(claims.account_id()?).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "account": AccountResponse::from(&account)
    })))
}

/// GET /auth/admin
pub async fn admin(claims: web::ReqData<AccessClaims>) -> Result<HttpResponse, AppError> {
    require_role(&claims, Role::Admin)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": format!("Welcome, {}", claims.username)
    })))
}
