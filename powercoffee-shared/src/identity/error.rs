use thiserror::Error;

use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::store::{StoreError, UniqueField};

/// Business errors for the identity workflow
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Username is already taken!")]
    DuplicateUsername,

    #[error("Email is already in use!")]
    DuplicateEmail,

    #[error("Phone number is already in use!")]
    DuplicatePhone,

    #[error("Role is not found: {0}")]
    RoleNotFound(String),

    /// Unknown user and wrong password are deliberately indistinguishable
    #[error("Invalid username or password")]
    AuthenticationFailed,

    #[error("External authentication failed: {0}")]
    ExternalAuthFailed(String),

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Current password is incorrect")]
    InvalidCredential,

    #[error("User not found")]
    UserNotFound,

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    #[error("token error: {0}")]
    Token(#[from] JwtError),
}

impl IdentityError {
    /// True for failures the caller cannot fix by changing the request
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            IdentityError::Store(_) | IdentityError::Password(_) | IdentityError::Token(_)
        )
    }
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(UniqueField::Username) => IdentityError::DuplicateUsername,
            StoreError::UniqueViolation(UniqueField::Email) => IdentityError::DuplicateEmail,
            StoreError::UniqueViolation(UniqueField::PhoneNumber) => IdentityError::DuplicatePhone,
            other => IdentityError::Store(other),
        }
    }
}
