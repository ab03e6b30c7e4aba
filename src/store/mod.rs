/// Credential Store Adapter
///
/// Reads and writes the credential fields of an account. Every mutation is a
/// single atomic row update; there is no session table and no in-process lock.
/// Concurrent writers to the same account race, the last one wins, and any
/// refresh token it displaced fails on its next use.
mod memory;
mod postgres;

pub use memory::InMemoryCredentialStore;
pub use postgres::PgCredentialStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::account::{Account, NewAccount};
use crate::error::AppError;

/// Outcome of presenting a verification token
#[derive(Debug, Clone)]
pub enum Redemption {
    /// Token matched and was live; the account is now verified and the token cleared
    Verified(Account),
    /// Token matched but was past its expiry; the token has been cleared
    Expired,
    /// No account holds this token
    NotFound,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create an account; fails with a unique-constraint error on a taken username or email
    async fn insert_account(&self, new_account: NewAccount) -> Result<Account, AppError>;

    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<Account>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AppError>;

    /// Overwrite (or clear, with `None`) the account's refresh-token fingerprint
    async fn persist_refresh_token(
        &self,
        account_id: Uuid,
        fingerprint: Option<&str>,
    ) -> Result<(), AppError>;

    /// Load the account only if `fingerprint` is its current one
    async fn load_account_by_refresh_token(
        &self,
        account_id: Uuid,
        fingerprint: &str,
    ) -> Result<Option<Account>, AppError>;

    /// Store a verification token and its expiry, replacing any pending one
    async fn persist_verification_token(
        &self,
        account_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Consume a verification token as of `now`
    async fn redeem_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Redemption, AppError>;
}
