/// JWT Claims structures
///
/// Access and refresh tokens carry different payloads. The access token is
/// self-contained (identity and role); the refresh token only names the account
/// and is useless without a matching fingerprint on the account row.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::{Account, Role};
use crate::error::AuthError;

/// Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject (account ID as UUID string)
    pub sub: String,
    pub username: String,
    /// Role at the time of issuance; a downgrade only shows up at the next refresh or login
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
}

impl AccessClaims {
    /// Create new claims from the account's current state
    ///
    /// # Arguments
    /// * `account` - Account the token is issued to
    /// * `expiry_seconds` - Token expiration in seconds from now
    /// * `issuer` - Issuer identifier
    pub fn new(account: &Account, expiry_seconds: i64, issuer: &str) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: account.id.to_string(),
            username: account.username.clone(),
            role: account.role,
            exp: now.saturating_add(expiry_seconds),
            iat: now,
            iss: issuer.to_string(),
        }
    }

    /// Extract account ID from claims
    pub fn account_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::TokenMalformed)
    }
}

/// Claims for refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RefreshClaims {
    pub sub: String,
    /// Unique per issuance so two sessions minted in the same second never collide
    pub jti: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

impl RefreshClaims {
    pub fn new(account_id: Uuid, expiry_seconds: i64, issuer: &str) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: account_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            exp: now.saturating_add(expiry_seconds),
            iat: now,
            iss: issuer.to_string(),
        }
    }

    pub fn account_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::TokenMalformed)
    }
}
