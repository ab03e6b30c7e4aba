use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::account::{Account, NewAccount};
use crate::error::{AppError, DatabaseError};
use crate::store::{CredentialStore, Redemption};

const ACCOUNT_COLUMNS: &str = "id, username, email, password_hash, role, is_verified, is_active, \
     verification_token, verification_expires_at, latest_session, created_at";

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    is_verified: bool,
    is_active: bool,
    verification_token: Option<String>,
    verification_expires_at: Option<DateTime<Utc>>,
    latest_session: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = AppError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role = row.role.parse().map_err(|e: String| {
            AppError::Database(DatabaseError::UnexpectedError(format!(
                "account {} has {}",
                row.id, e
            )))
        })?;

        Ok(Account {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            role,
            is_verified: row.is_verified,
            is_active: row.is_active,
            verification_token: row.verification_token,
            verification_expires_at: row.verification_expires_at,
            latest_session: row.latest_session,
            created_at: row.created_at,
        })
    }
}

/// Postgres-backed credential store over the `accounts` table
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn not_found(account_id: Uuid) -> AppError {
        AppError::Database(DatabaseError::NotFound(format!("account {}", account_id)))
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn insert_account(&self, new_account: NewAccount) -> Result<Account, AppError> {
        let account = Account::new(new_account);

        sqlx::query(
            r#"
            INSERT INTO accounts (id, username, email, password_hash, role, is_verified,
                                  is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            "#,
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.is_verified)
        .bind(account.is_active)
        .bind(account.created_at)
        .execute(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<Account>, AppError> {
        let query = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);

        sqlx::query_as::<_, AccountRow>(&query)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        let query = format!(
            "SELECT {} FROM accounts WHERE LOWER(username) = LOWER($1)",
            ACCOUNT_COLUMNS
        );

        sqlx::query_as::<_, AccountRow>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    async fn persist_refresh_token(
        &self,
        account_id: Uuid,
        fingerprint: Option<&str>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET latest_session = $1, updated_at = $2
            WHERE id = $3
            "#,
        )
        .bind(fingerprint)
        .bind(Utc::now())
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(account_id));
        }
        Ok(())
    }

    async fn load_account_by_refresh_token(
        &self,
        account_id: Uuid,
        fingerprint: &str,
    ) -> Result<Option<Account>, AppError> {
        let query = format!(
            "SELECT {} FROM accounts WHERE id = $1 AND latest_session = $2",
            ACCOUNT_COLUMNS
        );

        sqlx::query_as::<_, AccountRow>(&query)
            .bind(account_id)
            .bind(fingerprint)
            .fetch_optional(&self.pool)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    async fn persist_verification_token(
        &self,
        account_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET verification_token = $1, verification_expires_at = $2, updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(token)
        .bind(expires_at)
        .bind(Utc::now())
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(account_id));
        }
        Ok(())
    }

    async fn redeem_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Redemption, AppError> {
        // Only one of two concurrent redemptions can match this row
        let query = format!(
            r#"
            UPDATE accounts
            SET is_verified = TRUE, verification_token = NULL,
                verification_expires_at = NULL, updated_at = $2
            WHERE verification_token = $1 AND verification_expires_at > $2
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        );

        let verified = sqlx::query_as::<_, AccountRow>(&query)
            .bind(token)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = verified {
            return Ok(Redemption::Verified(Account::try_from(row)?));
        }

        // Whatever still holds the token is past its expiry
        let expired = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE accounts
            SET verification_token = NULL, verification_expires_at = NULL, updated_at = $2
            WHERE verification_token = $1
            RETURNING id
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match expired {
            Some(_) => Redemption::Expired,
            None => Redemption::NotFound,
        })
    }
}
