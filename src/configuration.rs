use crate::error::ConfigError;

const MIN_SECRET_LENGTH: usize = 32;
/// Upper bound for every configured lifetime: 5 years, in seconds
pub const MAX_TTL_SECONDS: i64 = 5 * 365 * 24 * 60 * 60;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    pub auth: AuthSettings,
    pub email: EmailClientSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Public origin used to build links in outgoing emails
    pub base_url: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }

    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// JWT signing settings
///
/// Access and refresh tokens are signed with different secrets, so a token of
/// one kind can never pass verification as the other.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_expiry: i64,  // seconds (e.g., 3600 for 60 minutes)
    pub refresh_token_expiry: i64, // seconds (e.g., 604800 for 7 days)
    pub issuer: String,
}

impl JwtSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.access_secret".to_string()));
        }
        if self.refresh_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.refresh_secret".to_string()));
        }
        if self.access_secret.len() < MIN_SECRET_LENGTH
            || self.refresh_secret.len() < MIN_SECRET_LENGTH
        {
            return Err(ConfigError::InvalidValue(format!(
                "jwt secrets must be at least {} bytes",
                MIN_SECRET_LENGTH
            )));
        }
        if self.access_secret == self.refresh_secret {
            return Err(ConfigError::InvalidValue(
                "jwt.access_secret and jwt.refresh_secret must differ".to_string(),
            ));
        }
        check_ttl("jwt.access_token_expiry", self.access_token_expiry)?;
        check_ttl("jwt.refresh_token_expiry", self.refresh_token_expiry)?;
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.issuer".to_string()));
        }
        Ok(())
    }
}

/// Credential lifecycle knobs that are not about signing
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    /// bcrypt work factor (4..=31)
    pub password_hash_cost: u32,
    pub verification_token_expiry: i64, // seconds (e.g., 7200 for 2 hours)
    pub secure_cookies: bool,
}

impl AuthSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(4..=31).contains(&self.password_hash_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "auth.password_hash_cost must be between 4 and 31, got {}",
                self.password_hash_cost
            )));
        }
        check_ttl("auth.verification_token_expiry", self.verification_token_expiry)?;
        Ok(())
    }
}

fn check_ttl(name: &str, seconds: i64) -> Result<(), ConfigError> {
    if seconds <= 0 || seconds > MAX_TTL_SECONDS {
        return Err(ConfigError::InvalidValue(format!(
            "{} must be between 1 and {} seconds, got {}",
            name, MAX_TTL_SECONDS, seconds
        )));
    }
    Ok(())
}

#[derive(serde::Deserialize, Clone)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender_email: String,
    pub timeout_milliseconds: u64,
}

impl EmailClientSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }

    /// HTTP client for the provider with the request timeout applied
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        reqwest::Client::builder()
            .timeout(self.timeout())
            .build()
            .map_err(|e| ConfigError::InvalidValue(format!("email http client: {}", e)))
    }
}

impl Settings {
    /// Refuse to start on incomplete or unsafe settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt.validate()?;
        self.auth.validate()?;
        Ok(())
    }
}

/// Defaults, then `configuration.yaml`, then `APP_*` environment overrides
fn layered_source() -> Result<config::Config, config::ConfigError> {
    config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8080)?
        .set_default("application.base_url", "http://127.0.0.1:8080")?
        .set_default("jwt.access_token_expiry", 3600)?
        .set_default("jwt.refresh_token_expiry", 604800)?
        .set_default("jwt.issuer", "credential-lifecycle")?
        .set_default("auth.password_hash_cost", bcrypt::DEFAULT_COST as i64)?
        .set_default("auth.verification_token_expiry", 7200)?
        .set_default("auth.secure_cookies", true)?
        .set_default("email.timeout_milliseconds", 10000)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = layered_source()?.try_deserialize::<Settings>()?;

    settings
        .validate()
        .map_err(|e| config::ConfigError::Message(e.to_string()))?;

    Ok(settings)
}

/// Database section only; usable without signing secrets
pub fn get_database_configuration() -> Result<DatabaseSettings, config::ConfigError> {
    layered_source()?.get::<DatabaseSettings>("database")
}
