/// Credential Signer
///
/// Creates and verifies HS256 JWTs. Holds two independent key pairs, one per
/// token kind, built once from configuration and never mutated.
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::account::Account;
use crate::auth::claims::{AccessClaims, RefreshClaims};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Which secret a token is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

pub struct CredentialSigner {
    access: KeyPair,
    refresh: KeyPair,
    issuer: String,
    access_ttl: i64,
    refresh_ttl: i64,
}

impl CredentialSigner {
    /// Build a signer from validated settings
    ///
    /// # Errors
    /// Returns a config error if a secret is missing, too short, or shared
    /// between the two token kinds.
    pub fn new(settings: &JwtSettings) -> Result<Self, AppError> {
        settings.validate()?;

        Ok(Self {
            access: KeyPair::from_secret(&settings.access_secret),
            refresh: KeyPair::from_secret(&settings.refresh_secret),
            issuer: settings.issuer.clone(),
            access_ttl: settings.access_token_expiry,
            refresh_ttl: settings.refresh_token_expiry,
        })
    }

    pub fn access_ttl(&self) -> i64 {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> i64 {
        self.refresh_ttl
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Sign arbitrary claims with the secret of `kind`
    ///
    /// The claims carry their own absolute `exp`.
    pub fn sign<C: Serialize>(&self, claims: &C, kind: TokenKind) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.keys(kind).encoding)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Verify signature, issuer and expiry, and decode the claims
    pub fn verify<C: DeserializeOwned>(&self, token: &str, kind: TokenKind) -> Result<C, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        decode::<C>(token, &self.keys(kind).decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let kind = match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    ErrorKind::InvalidSignature => AuthError::BadSignature,
                    _ => AuthError::TokenMalformed,
                };
                tracing::debug!(error = %e, code = kind.code(), "JWT validation error");
                kind
            })
    }

    /// Mint an access token from the account's current identity and role
    pub fn issue_access_token(&self, account: &Account) -> Result<String, AppError> {
        let claims = AccessClaims::new(account, self.access_ttl, &self.issuer);
        self.sign(&claims, TokenKind::Access)
    }

    /// Mint a refresh token; it names the account and nothing else
    pub fn issue_refresh_token(&self, account_id: Uuid) -> Result<String, AppError> {
        let claims = RefreshClaims::new(account_id, self.refresh_ttl, &self.issuer);
        self.sign(&claims, TokenKind::Refresh)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.verify(token, TokenKind::Access)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        self.verify(token, TokenKind::Refresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{NewAccount, Role};

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            access_secret: "test-access-secret-key-at-least-32-characters".to_string(),
            refresh_secret: "test-refresh-secret-key-at-least-32-characters".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
            issuer: "test".to_string(),
        }
    }

    fn test_account() -> Account {
        Account::new(NewAccount {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Admin,
        })
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let signer = CredentialSigner::new(&get_test_config()).unwrap();
        let account = test_account();

        let token = signer.issue_access_token(&account).expect("Failed to generate token");
        let claims = signer.verify_access_token(&token).expect("Failed to validate token");

        assert_eq!(claims.sub, account.id.to_string());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.iss, "test");
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let signer = CredentialSigner::new(&get_test_config()).unwrap();
        let id = Uuid::new_v4();

        let token = signer.issue_refresh_token(id).unwrap();
        let claims = signer.verify_refresh_token(&token).unwrap();

        assert_eq!(claims.account_id().unwrap(), id);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let signer = CredentialSigner::new(&get_test_config()).unwrap();
        let account = test_account();

        let refresh = signer.issue_refresh_token(account.id).unwrap();
        assert_eq!(
            signer.verify_access_token(&refresh),
            Err(AuthError::BadSignature)
        );

        let access = signer.issue_access_token(&account).unwrap();
        assert_eq!(
            signer.verify_refresh_token(&access),
            Err(AuthError::BadSignature)
        );
    }

    #[test]
    fn test_malformed_token() {
        let signer = CredentialSigner::new(&get_test_config()).unwrap();

        assert_eq!(
            signer.verify_access_token("invalid.token.here"),
            Err(AuthError::TokenMalformed)
        );
        assert_eq!(signer.verify_access_token(""), Err(AuthError::TokenMalformed));
    }

    #[test]
    fn test_tampered_token() {
        let signer = CredentialSigner::new(&get_test_config()).unwrap();
        let token = signer.issue_access_token(&test_account()).unwrap();

        // Tamper with token
        let tampered = format!("{}X", token);

        assert!(signer.verify_access_token(&tampered).is_err());
    }

    #[test]
    fn test_expired_token() {
        let signer = CredentialSigner::new(&get_test_config()).unwrap();
        let claims = AccessClaims::new(&test_account(), -120, "test");
        let token = signer.sign(&claims, TokenKind::Access).unwrap();

        assert_eq!(
            signer.verify_access_token(&token),
            Err(AuthError::TokenExpired)
        );
    }

    #[test]
    fn test_wrong_issuer() {
        let mut config = get_test_config();
        let signer = CredentialSigner::new(&config).unwrap();
        let token = signer.issue_access_token(&test_account()).unwrap();

        config.issuer = "wrong-issuer".to_string();
        let other = CredentialSigner::new(&config).unwrap();

        assert_eq!(
            other.verify_access_token(&token),
            Err(AuthError::TokenMalformed)
        );
    }

    #[test]
    fn test_shared_secret_refused() {
        let mut config = get_test_config();
        config.refresh_secret = config.access_secret.clone();

        assert!(CredentialSigner::new(&config).is_err());
    }
}
