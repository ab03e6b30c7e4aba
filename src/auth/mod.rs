/// Authentication module
///
/// Token signing and verification, password hashing, refresh-token
/// fingerprints, verification tokens, and the `AuthService` that ties
/// them to the credential store.

mod claims;
mod jwt;
mod password;
mod refresh;
mod refresh_token;
mod service;
mod session;
mod verification;
mod verification_token;

pub use claims::{AccessClaims, RefreshClaims};
pub use jwt::{CredentialSigner, TokenKind};
pub use password::{hash_password, validate_password_strength, verify_password};
pub use refresh::RefreshedAccess;
pub use refresh_token::fingerprint;
pub use service::{AuthService, Registration, Session, SessionTokens};
pub use verification::Delivery;
pub use verification_token::VerificationToken;
