/// Credential lifecycle service
///
/// Owns the signer, the credential store and the mailer, and exposes the
/// operations the transport layer calls. Operations live in sibling modules:
/// `session` (login/logout), `refresh`, and `verification`.
use std::sync::Arc;

use uuid::Uuid;

use crate::account::{Account, NewAccount, Role};
use crate::auth::claims::AccessClaims;
use crate::auth::jwt::CredentialSigner;
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::auth::verification::Delivery;
use crate::configuration::AuthSettings;
use crate::email_client::EmailSender;
use crate::error::{AppError, AuthError};
use crate::store::CredentialStore;
use crate::validators::{is_valid_email, is_valid_username};

/// Access/refresh pair handed to the transport layer
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// seconds
    pub access_expires_in: i64,
    /// seconds
    pub refresh_expires_in: i64,
}

/// A freshly established session and the account it belongs to
#[derive(Debug, Clone)]
pub struct Session {
    pub account: Account,
    pub tokens: SessionTokens,
}

/// Result of a successful registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub account: Account,
    pub delivery: Delivery,
}

#[derive(Clone)]
pub struct AuthService {
    pub(crate) store: Arc<dyn CredentialStore>,
    pub(crate) signer: Arc<CredentialSigner>,
    pub(crate) mailer: Arc<dyn EmailSender>,
    pub(crate) settings: AuthSettings,
    /// Public origin the verification link points at
    pub(crate) base_url: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        signer: Arc<CredentialSigner>,
        mailer: Arc<dyn EmailSender>,
        settings: AuthSettings,
        base_url: String,
    ) -> Self {
        Self {
            store,
            signer,
            mailer,
            settings,
            base_url,
        }
    }

    pub fn signer(&self) -> Arc<CredentialSigner> {
        Arc::clone(&self.signer)
    }

    /// Decode an access token; the only thing downstream authorization needs
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.signer.verify_access_token(token)
    }

    /// Create an unverified member account and send its verification email
    ///
    /// A failed delivery does not undo the account; it is reported in
    /// `Registration::delivery` so the caller can offer a resend.
    ///
    /// # Errors
    /// - Validation errors for malformed username, email or weak password
    /// - Duplicate entry when the username or email is taken
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Registration, AppError> {
        let username = is_valid_username(username)?;
        let email = is_valid_email(email)?;
        validate_password_strength(password)?;

        let password_hash = self.hash_password(password).await?;

        let account = self
            .store
            .insert_account(NewAccount {
                username,
                email,
                password_hash,
                role: Role::Member,
            })
            .await?;

        tracing::info!(account_id = %account.id, "Account registered");

        let delivery = self.issue_verification(&account).await?;
        Ok(Registration { account, delivery })
    }

    /// Current state of an account, for the authenticated caller
    pub async fn current_account(&self, account_id: Uuid) -> Result<Account, AppError> {
        self.store
            .find_by_id(account_id)
            .await?
            .ok_or(AppError::Auth(AuthError::AccountNotFound))
    }

    pub(crate) async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_string();
        let cost = self.settings.password_hash_cost;

        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    /// bcrypt comparison on the blocking pool; never cached or short-circuited
    pub(crate) async fn check_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let password = password.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
    }
}
