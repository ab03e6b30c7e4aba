/// Verification Workflow
///
/// UNVERIFIED -> PENDING (token issued) -> VERIFIED (redeemed in time).
/// An expired token is cleared on its first presentation and the account
/// stays unverified until a new one is issued.
use chrono::Utc;

use crate::account::Account;
use crate::auth::service::{AuthService, Session};
use crate::auth::verification_token::VerificationToken;
use crate::error::{AppError, AuthError, EmailError};
use crate::store::Redemption;

/// What happened to the verification email
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Sent,
    /// Token was stored but the provider refused or was unreachable
    Failed(EmailError),
    /// Nothing to send
    AlreadyVerified,
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent)
    }
}

impl AuthService {
    /// Issue a fresh verification token and email the redemption link
    ///
    /// Any pending token is overwritten, which invalidates the old link.
    /// Storage failures are errors; delivery failures are reported in the
    /// returned `Delivery`.
    pub async fn issue_verification(&self, account: &Account) -> Result<Delivery, AppError> {
        let token = VerificationToken::new(self.settings.verification_token_expiry)?;

        self.store
            .persist_verification_token(account.id, token.token(), token.expires_at())
            .await?;

        let link = format!(
            "{}/auth/verify-email?token={}",
            self.base_url.trim_end_matches('/'),
            token.token()
        );
        let html_content = format!(
            r#"
        <h1>Welcome {}!</h1>
        <p>Please verify your email address by clicking the link below:</p>
        <a href="{}">Verify Email</a>
        <p>This link will expire in {} minutes.</p>
        "#,
            account.username,
            link,
            self.settings.verification_token_expiry / 60
        );

        match self
            .mailer
            .send_email(&account.email, "Verify your email address", &html_content)
            .await
        {
            Ok(()) => {
                tracing::info!(account_id = %account.id, "Verification email sent");
                Ok(Delivery::Sent)
            }
            Err(e) => {
                tracing::warn!(
                    account_id = %account.id,
                    error = %e,
                    "Verification email could not be delivered"
                );
                Ok(Delivery::Failed(e))
            }
        }
    }

    /// Consume a verification token and log the account in
    ///
    /// # Errors
    /// - `TOKEN_NOT_FOUND` when no account holds the token
    /// - `TOKEN_EXPIRED` when it was past expiry (the token is cleared)
    /// - `DEACTIVATED` when the account was verified but cannot sign in
    pub async fn redeem_verification(&self, token: &str) -> Result<Session, AppError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::VerificationTokenNotFound.into());
        }

        let account = match self.store.redeem_verification_token(token, Utc::now()).await? {
            Redemption::Verified(account) => account,
            Redemption::Expired => {
                tracing::warn!("Expired verification token presented");
                return Err(AuthError::VerificationTokenExpired.into());
            }
            Redemption::NotFound => {
                tracing::warn!("Unknown verification token presented");
                return Err(AuthError::VerificationTokenNotFound.into());
            }
        };

        tracing::info!(account_id = %account.id, "Email verified");

        if !account.is_active {
            tracing::warn!(account_id = %account.id, "Verified account is deactivated");
            return Err(AuthError::Deactivated.into());
        }

        let tokens = self.issue_session(&account).await?;
        Ok(Session { account, tokens })
    }

    /// Re-send the verification email for `username`
    pub async fn resend_verification(&self, username: &str) -> Result<Delivery, AppError> {
        let account = self
            .store
            .find_by_username(username.trim())
            .await?
            .ok_or(AppError::Auth(AuthError::AccountNotFound))?;

        if account.is_verified {
            tracing::info!(account_id = %account.id, "Resend skipped: already verified");
            return Ok(Delivery::AlreadyVerified);
        }

        self.issue_verification(&account).await
    }
}
