/// Account model
///
/// The account row is the only durable state the credential core touches.
/// Everything about a caller's sessions and email verification lives on it.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Account role, ordered from least to most privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Author,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Author => "author",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Role::Member),
            "author" => Ok(Role::Author),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// bcrypt hash; the plaintext password is never stored
    pub password_hash: String,
    pub role: Role,
    pub is_verified: bool,
    pub is_active: bool,
    pub verification_token: Option<String>,
    pub verification_expires_at: Option<DateTime<Utc>>,
    /// SHA-256 fingerprint of the single live refresh token.
    /// One session per account: every login overwrites it, logout clears it.
    pub latest_session: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Builds a fresh, unverified, active account
    pub fn new(new_account: NewAccount) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: new_account.username,
            email: new_account.email,
            password_hash: new_account.password_hash,
            role: new_account.role,
            is_verified: false,
            is_active: true,
            verification_token: None,
            verification_expires_at: None,
            latest_session: None,
            created_at: Utc::now(),
        }
    }
}

/// Input for creating an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}
