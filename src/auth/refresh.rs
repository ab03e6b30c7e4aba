/// Session Refresher
///
/// A refresh token is accepted only when its signature and expiry check out
/// AND its fingerprint is the one stored on the account. The second check is
/// the actual revocation mechanism: logout and re-login make older tokens
/// useless long before they expire.
use crate::auth::refresh_token::fingerprint;
use crate::auth::service::AuthService;
use crate::error::{AppError, AuthError};

/// A new access token minted from the account's current state
#[derive(Debug, Clone)]
pub struct RefreshedAccess {
    pub access_token: String,
    /// seconds
    pub expires_in: i64,
}

impl AuthService {
    /// Exchange a live refresh token for a fresh access token
    ///
    /// Identity and role come from the account row, never from the old token.
    /// The refresh token itself is not rotated; it stays usable until expiry,
    /// logout, or the next login.
    pub async fn refresh(&self, presented: Option<&str>) -> Result<RefreshedAccess, AppError> {
        let token = presented
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Auth(AuthError::MissingToken))?;

        let claims = self.signer.verify_refresh_token(token).map_err(|kind| {
            tracing::warn!(code = kind.code(), "Refresh token failed verification");
            AppError::Auth(AuthError::InvalidRefreshToken)
        })?;

        let account_id = claims
            .account_id()
            .map_err(|_| AppError::Auth(AuthError::InvalidRefreshToken))?;

        let account = self
            .store
            .load_account_by_refresh_token(account_id, &fingerprint(token))
            .await?
            .ok_or_else(|| {
                tracing::warn!(account_id = %account_id, "Refresh token is not the live session");
                AppError::Auth(AuthError::InvalidRefreshToken)
            })?;

        // Re-checked on every refresh, not only at login
        if !account.is_active {
            tracing::warn!(account_id = %account.id, "Refresh rejected: account deactivated");
            return Err(AuthError::Deactivated.into());
        }
        if !account.is_verified {
            tracing::warn!(account_id = %account.id, "Refresh rejected: account not verified");
            return Err(AuthError::NotVerified.into());
        }

        let access_token = self.signer.issue_access_token(&account)?;

        tracing::info!(account_id = %account.id, "Access token refreshed");
        Ok(RefreshedAccess {
            access_token,
            expires_in: self.signer.access_ttl(),
        })
    }
}
