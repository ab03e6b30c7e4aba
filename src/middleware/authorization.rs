use uuid::Uuid;

use crate::account::Role;
use crate::auth::AccessClaims;
use crate::error::{AppError, AuthError};

/// Rejects callers whose role ranks below `minimum` (member < author < admin)
pub fn require_role(claims: &AccessClaims, minimum: Role) -> Result<(), AppError> {
    if claims.role >= minimum {
        return Ok(());
    }
    tracing::warn!(
        account_id = %claims.sub,
        role = %claims.role,
        required = %minimum,
        "Insufficient role"
    );
    Err(AuthError::Forbidden.into())
}

/// Admins may act on anything; everyone else only on what they own
pub fn require_owner_or_admin(claims: &AccessClaims, owner_id: Uuid) -> Result<(), AppError> {
    if claims.role == Role::Admin {
        return Ok(());
    }
    match claims.account_id() {
        Ok(id) if id == owner_id => Ok(()),
        _ => {
            tracing::warn!(account_id = %claims.sub, owner_id = %owner_id, "Not the owner");
            Err(AuthError::Forbidden.into())
        }
    }
}
