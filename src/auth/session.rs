/// Session Issuer
///
/// Primary authentication. Checks run in a fixed order and nothing is written
/// unless all of them pass.
use uuid::Uuid;

use crate::account::Account;
use crate::auth::refresh_token::fingerprint;
use crate::auth::service::{AuthService, Session, SessionTokens};
use crate::error::{AppError, AuthError};

impl AuthService {
    /// Authenticate with username and password and open a new session
    ///
    /// Order of checks:
    /// 1. account exists (`NOT_FOUND`)
    /// 2. account is verified (`NOT_VERIFIED`), before the password is looked at
    /// 3. account is active (`DEACTIVATED`)
    /// 4. password matches (`BAD_CREDENTIAL`)
    ///
    /// A successful login overwrites the stored refresh fingerprint, ending any
    /// other session of the same account.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AppError> {
        let account = self
            .store
            .find_by_username(username.trim())
            .await?
            .ok_or_else(|| {
                tracing::warn!("Login for unknown account");
                AppError::Auth(AuthError::AccountNotFound)
            })?;

        if !account.is_verified {
            tracing::warn!(account_id = %account.id, "Login rejected: account not verified");
            return Err(AuthError::NotVerified.into());
        }

        if !account.is_active {
            tracing::warn!(account_id = %account.id, "Login rejected: account deactivated");
            return Err(AuthError::Deactivated.into());
        }

        if !self.check_password(password, &account.password_hash).await? {
            tracing::warn!(account_id = %account.id, "Login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials.into());
        }

        let tokens = self.issue_session(&account).await?;

        tracing::info!(account_id = %account.id, "Account logged in");
        Ok(Session { account, tokens })
    }

    /// Mint an access/refresh pair and make the refresh token the account's only live one
    pub(crate) async fn issue_session(&self, account: &Account) -> Result<SessionTokens, AppError> {
        let access_token = self.signer.issue_access_token(account)?;
        let refresh_token = self.signer.issue_refresh_token(account.id)?;

        self.store
            .persist_refresh_token(account.id, Some(&fingerprint(&refresh_token)))
            .await?;

        Ok(SessionTokens {
            access_token,
            refresh_token,
            access_expires_in: self.signer.access_ttl(),
            refresh_expires_in: self.signer.refresh_ttl(),
        })
    }

    /// Revoke the account's session
    ///
    /// Outstanding access tokens stay valid until their own expiry.
    pub async fn logout(&self, account_id: Uuid) -> Result<(), AppError> {
        self.store
            .persist_refresh_token(account_id, None)
            .await
            .map_err(|e| match e {
                AppError::Database(crate::error::DatabaseError::NotFound(_)) => {
                    AppError::Auth(AuthError::AccountNotFound)
                }
                other => other,
            })?;

        tracing::info!(account_id = %account_id, "Account logged out");
        Ok(())
    }
}
