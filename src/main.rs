use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

use credential_lifecycle::auth::{AuthService, CredentialSigner};
use credential_lifecycle::configuration::get_configuration;
use credential_lifecycle::cookies::CookiePolicy;
use credential_lifecycle::email_client::{EmailClient, SenderEmail};
use credential_lifecycle::startup::{run, AppState};
use credential_lifecycle::store::PgCredentialStore;
use credential_lifecycle::telemetry::init_telemetry;

fn startup_error(kind: std::io::ErrorKind, message: &str) -> std::io::Error {
    std::io::Error::new(kind, message.to_string())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry("info");

    tracing::info!("Starting application");

    // Missing or weak secrets stop the process here
    let configuration = get_configuration().map_err(|e| {
        tracing::error!(error = %e, "Failed to read configuration");
        startup_error(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    let signer = CredentialSigner::new(&configuration.jwt).map_err(|e| {
        tracing::error!(error = %e, "Invalid signing configuration");
        startup_error(std::io::ErrorKind::InvalidInput, "Signing configuration error")
    })?;

    tracing::info!("Attempting to connect to database");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create connection pool");
            startup_error(std::io::ErrorKind::ConnectionRefused, "Database connection error")
        })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to run database migrations");
        startup_error(std::io::ErrorKind::Other, "Migration error")
    })?;

    let sender = SenderEmail::parse(configuration.email.sender_email.clone()).map_err(|e| {
        tracing::error!(error = %e, "Invalid sender email");
        startup_error(std::io::ErrorKind::InvalidInput, "Email configuration error")
    })?;
    let http_client = configuration.email.http_client().map_err(|e| {
        tracing::error!(error = %e, "Failed to build email HTTP client");
        startup_error(std::io::ErrorKind::Other, "Email configuration error")
    })?;
    let email_client = EmailClient::new(configuration.email.base_url.clone(), sender, http_client);

    let service = AuthService::new(
        Arc::new(PgCredentialStore::new(pool)),
        Arc::new(signer),
        Arc::new(email_client),
        configuration.auth.clone(),
        configuration.application.base_url.clone(),
    );
    let state = AppState::new(
        service,
        CookiePolicy::new(configuration.auth.secure_cookies),
    );

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!(address = %address, "Server listening");

    run(listener, state)?.await
}
