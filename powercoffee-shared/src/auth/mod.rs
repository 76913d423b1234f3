/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing behind the `PasswordHasher` trait
/// - [`jwt`]: JWT generation and validation behind the `TokenIssuer` trait
/// - [`reset_token`]: Password reset token generation and digesting
/// - [`google`]: Google ID token verification behind the `IdentityProvider` trait
/// - [`middleware`]: Axum bearer-token middleware and the request `AuthContext`
/// - [`authorization`]: Role and ownership checks
///
/// # Example
///
/// ```no_run
/// use powercoffee_shared::auth::password::{hash_password, verify_password};
/// use powercoffee_shared::auth::jwt::{create_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "alice".to_string(), vec!["admin".to_string()]);
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long")?;
/// # Ok(())
/// # }
/// ```

pub mod password;
pub mod jwt;
pub mod reset_token;
pub mod google;
pub mod middleware;
pub mod authorization;
