use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::account::{Account, NewAccount, Role};
use crate::error::{AppError, DatabaseError};
use crate::store::{CredentialStore, Redemption};

/// Process-local credential store
///
/// Every operation runs under one mutex, which gives the same single-row
/// atomicity the Postgres store gets from `UPDATE ... WHERE`.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    accounts: Mutex<HashMap<Uuid, Account>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Account>>, AppError> {
        self.accounts
            .lock()
            .map_err(|_| AppError::Internal("credential store lock poisoned".to_string()))
    }

    fn update<F>(&self, account_id: Uuid, apply: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut Account),
    {
        let mut accounts = self.lock()?;
        let account = accounts.get_mut(&account_id).ok_or_else(|| {
            AppError::Database(DatabaseError::NotFound(format!("account {}", account_id)))
        })?;
        apply(account);
        Ok(())
    }

    /// Administrative switch; the credential core only reads this flag
    pub fn set_active(&self, account_id: Uuid, is_active: bool) -> Result<(), AppError> {
        self.update(account_id, |account| account.is_active = is_active)
    }

    /// Administrative role change
    pub fn set_role(&self, account_id: Uuid, role: Role) -> Result<(), AppError> {
        self.update(account_id, |account| account.role = role)
    }

    /// Marks an account verified without going through the email flow
    pub fn mark_verified(&self, account_id: Uuid) -> Result<(), AppError> {
        self.update(account_id, |account| account.is_verified = true)
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn insert_account(&self, new_account: NewAccount) -> Result<Account, AppError> {
        let mut accounts = self.lock()?;

        let taken = accounts
            .values()
            .any(|a| {
                a.username.eq_ignore_ascii_case(&new_account.username)
                    || a.email.eq_ignore_ascii_case(&new_account.email)
            });
        if taken {
            return Err(AppError::Database(DatabaseError::UniqueConstraintViolation(
                "Account already exists".to_string(),
            )));
        }

        let account = Account::new(new_account);
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<Account>, AppError> {
        Ok(self.lock()?.get(&account_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        Ok(self
            .lock()?
            .values()
            .find(|a| a.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn persist_refresh_token(
        &self,
        account_id: Uuid,
        fingerprint: Option<&str>,
    ) -> Result<(), AppError> {
        self.update(account_id, |account| {
            account.latest_session = fingerprint.map(str::to_string)
        })
    }

    async fn load_account_by_refresh_token(
        &self,
        account_id: Uuid,
        fingerprint: &str,
    ) -> Result<Option<Account>, AppError> {
        Ok(self
            .lock()?
            .get(&account_id)
            .filter(|a| a.latest_session.as_deref() == Some(fingerprint))
            .cloned())
    }

    async fn persist_verification_token(
        &self,
        account_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.update(account_id, |account| {
            account.verification_token = Some(token.to_string());
            account.verification_expires_at = Some(expires_at);
        })
    }

    async fn redeem_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Redemption, AppError> {
        let mut accounts = self.lock()?;

        let account = match accounts
            .values_mut()
            .find(|a| a.verification_token.as_deref() == Some(token))
        {
            Some(account) => account,
            None => return Ok(Redemption::NotFound),
        };

        let live = account
            .verification_expires_at
            .map(|expires_at| expires_at > now)
            .unwrap_or(false);

        account.verification_token = None;
        account.verification_expires_at = None;

        if !live {
            return Ok(Redemption::Expired);
        }

        account.is_verified = true;
        Ok(Redemption::Verified(account.clone()))
    }
}
