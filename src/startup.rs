use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::AuthService;
use crate::cookies::CookiePolicy;
use crate::error::{AppError, AuthError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    admin, health_check, login, logout, me, refresh_token, register, resend_verification, verify,
    verify_email,
};

/// Everything the handlers share
#[derive(Clone)]
pub struct AppState {
    pub service: AuthService,
    pub cookies: CookiePolicy,
}

impl AppState {
    pub fn new(service: AuthService, cookies: CookiePolicy) -> Self {
        Self { service, cookies }
    }
}

/// Registers shared state and every route; used by `run` and by HTTP tests
pub fn configure_app(cfg: &mut web::ServiceConfig, state: &AppState) {
    let signer = state.service.signer();

    cfg.app_data(web::Data::new(state.service.clone()))
        .app_data(web::Data::new(state.cookies))
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            AppError::Validation(ValidationError::InvalidFormat(format!("request body: {}", err)))
                .into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|_err, _req| {
            AppError::Auth(AuthError::VerificationTokenNotFound).into()
        }))
        .route("/health_check", web::get().to(health_check))
        .service(
            web::scope("/auth")
                // Public routes
                .route("/register", web::post().to(register))
                .route("/login", web::post().to(login))
                .route("/refresh-token", web::post().to(refresh_token))
                .route("/verify-email", web::get().to(verify_email))
                .route("/resend-verification", web::post().to(resend_verification))
                // Protected routes (require an access token)
                .service(
                    web::resource("/logout")
                        .wrap(JwtMiddleware::new(signer.clone()))
                        .route(web::post().to(logout)),
                )
                .service(
                    web::resource("/verify")
                        .wrap(JwtMiddleware::new(signer.clone()))
                        .route(web::get().to(verify)),
                )
                .service(
                    web::resource("/me")
                        .wrap(JwtMiddleware::new(signer.clone()))
                        .route(web::get().to(me)),
                )
                .service(
                    web::resource("/admin")
                        .wrap(JwtMiddleware::new(signer))
                        .route(web::get().to(admin)),
                ),
        );
}

pub fn run(listener: TcpListener, state: AppState) -> Result<Server, std::io::Error> {
    let server = HttpServer::new(move || {
        App::new()
            .wrap(LoggerMiddleware)
            .configure(|cfg| configure_app(cfg, &state))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
