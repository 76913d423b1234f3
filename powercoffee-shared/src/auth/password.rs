/// Password hashing module using Argon2id
///
/// Passwords are never stored in plaintext. Every stored credential is a PHC
/// string produced by [`Argon2Hasher`]; verification reads the parameters
/// back out of the stored hash, so hashes made with different parameters
/// still verify.
///
/// # Security
///
/// - **Algorithm**: Argon2id
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
///
/// # Example
///
/// ```
/// use powercoffee_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("pw1")?;
/// assert!(verify_password("pw1", &hash)?);
/// assert!(!verify_password("pw2", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// One-way password hashing
///
/// Implementations are CPU-bound; async callers should run them on a
/// blocking thread.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password into a self-describing hash string
    fn hash(&self, password: &str) -> Result<String, PasswordError>;

    /// Checks a plaintext password against a stored hash
    ///
    /// Returns `Ok(false)` on mismatch; errors are reserved for unreadable hashes.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError>;
}

/// Argon2id hasher with configurable cost parameters
#[derive(Debug, Clone, Copy)]
pub struct Argon2Hasher {
    m_cost: u32,
    t_cost: u32,
    p_cost: u32,
}

impl Argon2Hasher {
    /// Production parameters: 64 MB, 3 iterations, 4 lanes
    pub const fn new() -> Self {
        Self {
            m_cost: 65536,
            t_cost: 3,
            p_cost: 4,
        }
    }

    /// Custom cost parameters
    ///
    /// Tests use the Argon2 minimums (`8, 1, 1`) to keep suites fast.
    pub const fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Self {
        Self {
            m_cost,
            t_cost,
            p_cost,
        }
    }

    fn argon2(&self) -> Result<Argon2<'static>, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(self.m_cost)
            .t_cost(self.t_cost)
            .p_cost(self.p_cost)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

        Ok(password_hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

        // Parameters come from the PHC string, not from self
        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
        }
    }
}

/// Hashes a password with the production parameters
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    Argon2Hasher::new().hash(password)
}

/// Verifies a password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    Argon2Hasher::new().verify(password, hash)
}
