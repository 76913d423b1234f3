/// JWT token generation and validation module
///
/// Tokens are signed with HS256 and carry the user's id, username and role
/// names, so authenticated requests can be authorized without a store lookup.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: Configurable (default 24 hours)
/// - **Validation**: Signature, expiration, not-before and issuer checks
/// - **Secret Management**: Secrets should be at least 32 bytes (256 bits)
///
/// # Example
///
/// ```
/// use powercoffee_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let claims = Claims::new(user_id, "alice".to_string(), vec!["employee".to_string()]);
/// let token = create_token(&claims, "your-secret-key-at-least-32-bytes")?;
///
/// let validated = validate_token(&token, "your-secret-key-at-least-32-bytes")?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::User;

/// Issuer claim stamped on and required of every token
pub const ISSUER: &str = "powercoffee";

/// Default token lifetime
pub const DEFAULT_EXPIRATION_HOURS: i64 = 24;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "powercoffee")
/// - `iat`, `exp`, `nbf`: Unix timestamps
///
/// # Custom Claims
///
/// - `username`: The user's login name at issue time
/// - `roles`: Role names (`customer`, `employee`, `admin`, `super_admin`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    pub username: String,

    pub roles: Vec<String>,

    /// Issuer - Always "powercoffee"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Creates claims with the default 24 hour expiration
    pub fn new(user_id: Uuid, username: String, roles: Vec<String>) -> Self {
        Self::with_expiration(
            user_id,
            username,
            roles,
            Duration::hours(DEFAULT_EXPIRATION_HOURS),
        )
    }

    /// Creates claims with custom expiration
    ///
    /// A negative duration yields already-expired claims, which tests use.
    pub fn with_expiration(
        user_id: Uuid,
        username: String,
        roles: Vec<String>,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            username,
            roles,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Creates a JWT token from claims, signed with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT token and extracts claims
///
/// Verifies the signature, expiration, not-before time and issuer.
///
/// # Errors
///
/// - `JwtError::Expired` when `exp` has passed
/// - `JwtError::InvalidIssuer` when the issuer is not "powercoffee"
/// - `JwtError::ValidationError` for anything else (bad signature, malformed token)
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: ISSUER.to_string(),
        },
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Mints and verifies bearer tokens for authenticated users
pub trait TokenIssuer: Send + Sync {
    /// Issues a token carrying the user's id, username and role names
    fn issue(&self, user: &User) -> Result<String, JwtError>;

    /// Verifies a token and returns its claims
    fn verify(&self, token: &str) -> Result<Claims, JwtError>;
}

/// HS256 token issuer backed by a shared secret
#[derive(Clone)]
pub struct JwtIssuer {
    secret: String,
    expiration: Duration,
}

impl JwtIssuer {
    pub fn new(secret: impl Into<String>, expiration: Duration) -> Self {
        Self {
            secret: secret.into(),
            expiration,
        }
    }
}

impl std::fmt::Debug for JwtIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIssuer")
            .field("secret", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl TokenIssuer for JwtIssuer {
    fn issue(&self, user: &User) -> Result<String, JwtError> {
        let claims = Claims::with_expiration(
            user.id,
            user.username.clone(),
            user.role_names(),
            self.expiration,
        );
        create_token(&claims, &self.secret)
    }

    fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        validate_token(token, &self.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn claims() -> Claims {
        Claims::new(
            Uuid::new_v4(),
            "alice".to_string(),
            vec!["employee".to_string()],
        )
    }

    #[test]
    fn test_claims_creation() {
        let claims = claims();

        assert_eq!(claims.iss, "powercoffee");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.roles, vec!["employee"]);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_create_and_validate_token() {
        let claims = claims();
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.sub, claims.sub);
        assert_eq!(validated.username, "alice");
        assert_eq!(validated.roles, vec!["employee"]);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let token = create_token(&claims(), "secret1").expect("Should create token");

        let result = validate_token(&token, "wrong-secret");
        assert!(matches!(result, Err(JwtError::ValidationError(_))));
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::with_expiration(
            Uuid::new_v4(),
            "alice".to_string(),
            vec![],
            Duration::seconds(-3600),
        );
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).expect("Should create token");
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_validate_foreign_issuer() {
        let mut claims = claims();
        claims.iss = "someone-else".to_string();
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(
            validate_token(&token, SECRET),
            Err(JwtError::InvalidIssuer { .. })
        ));
    }

    #[test]
    fn test_garbage_token() {
        assert!(validate_token("not.a.jwt", SECRET).is_err());
        assert!(validate_token("", SECRET).is_err());
    }

    #[test]
    fn test_issuer_debug_redacts_secret() {
        let issuer = JwtIssuer::new(SECRET, Duration::hours(1));
        let debug = format!("{:?}", issuer);
        assert!(!debug.contains(SECRET));
    }
}
