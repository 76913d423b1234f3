/// Authorization helpers and permission checks
///
/// Role-based access control over the request's [`AuthContext`]. Checks are
/// pure functions of the context; nothing here touches the store.
///
/// # Permission Model
///
/// - `super_admin` may manage any user and any coffee shop
/// - `admin` may manage coffee shops it owns
/// - every authenticated user may read and edit their own user record
///
/// # Example
///
/// ```
/// use powercoffee_shared::auth::authorization::require_any_role;
/// use powercoffee_shared::auth::middleware::AuthContext;
/// use powercoffee_shared::models::role::RoleName;
/// use uuid::Uuid;
///
/// let auth = AuthContext {
///     user_id: Uuid::new_v4(),
///     username: "bob".to_string(),
///     roles: vec![RoleName::Admin],
/// };
/// assert!(require_any_role(&auth, &[RoleName::Admin, RoleName::SuperAdmin]).is_ok());
/// assert!(require_any_role(&auth, &[RoleName::SuperAdmin]).is_err());
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::role::RoleName;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User doesn't hold any of the required roles
    #[error("Insufficient permissions: requires one of {required:?}")]
    InsufficientRole { required: Vec<RoleName> },

    /// User doesn't own the resource
    #[error("Not authorized to access this resource")]
    NotAuthorized,
}

/// Requires at least one of `roles`
pub fn require_any_role(auth: &AuthContext, roles: &[RoleName]) -> Result<(), AuthzError> {
    if auth.has_any_role(roles) {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole {
            required: roles.to_vec(),
        })
    }
}

/// Requires the caller to be `user_id`
pub fn require_self(auth: &AuthContext, user_id: Uuid) -> Result<(), AuthzError> {
    if auth.user_id == user_id {
        Ok(())
    } else {
        Err(AuthzError::NotAuthorized)
    }
}

/// Requires the caller to be `user_id` or to hold one of `roles`
pub fn require_self_or_any_role(
    auth: &AuthContext,
    user_id: Uuid,
    roles: &[RoleName],
) -> Result<(), AuthzError> {
    if auth.user_id == user_id || auth.has_any_role(roles) {
        Ok(())
    } else {
        Err(AuthzError::NotAuthorized)
    }
}

/// Checks access to a coffee shop owned by `owner_id`
///
/// `super_admin` passes for any shop; `admin` only for its own.
pub fn require_shop_access(auth: &AuthContext, owner_id: Uuid) -> Result<(), AuthzError> {
    if auth.has_role(RoleName::SuperAdmin) {
        return Ok(());
    }

    if auth.has_role(RoleName::Admin) && auth.user_id == owner_id {
        return Ok(());
    }

    Err(AuthzError::NotAuthorized)
}
