use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::error::ConfigError;

const TOKEN_LENGTH: usize = 64;

/// One-time email verification token
///
/// An opaque random value plus the absolute instant after which it can no
/// longer be redeemed. Both are stored on the account.
#[derive(Clone, Debug)]
pub struct VerificationToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl VerificationToken {
    /// Fails when `expiry_seconds` does not fit a calendar date
    pub fn new(expiry_seconds: i64) -> Result<Self, ConfigError> {
        let expires_at = Duration::try_seconds(expiry_seconds)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "verification token expiry of {} seconds is out of range",
                    expiry_seconds
                ))
            })?;

        let token = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();

        Ok(Self { token, expires_at })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_token_creation() {
        let token = VerificationToken::new(7200).unwrap();

        assert_eq!(token.token().len(), TOKEN_LENGTH);
        assert!(token.token().chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(token.expires_at() > Utc::now() + Duration::minutes(119));
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(
            VerificationToken::new(7200).unwrap().token(),
            VerificationToken::new(7200).unwrap().token()
        );
    }

    #[test]
    fn test_negative_ttl_is_already_past() {
        let token = VerificationToken::new(-1).unwrap();
        assert!(token.expires_at() < Utc::now());
    }

    #[test]
    fn test_out_of_range_ttl_is_an_error() {
        for ttl in [i64::MAX / 100, i64::MAX] {
            assert!(matches!(
                VerificationToken::new(ttl),
                Err(ConfigError::InvalidValue(_))
            ));
        }
    }
}
