/// Configuration management for the API server
///
/// Loaded from environment variables, with a `.env` file honored in
/// development.
///
/// # Environment Variables
///
/// - `API_HOST` / `API_PORT`: bind address (default `0.0.0.0:8080`)
/// - `API_PRODUCTION`: enables HSTS (default false)
/// - `CORS_ORIGINS`: comma-separated origins, `*` for any (default `*`)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default 10)
/// - `JWT_SECRET`: HS256 signing secret, at least 32 characters (required)
/// - `JWT_EXPIRATION_HOURS`: token lifetime (default 24)
/// - `GOOGLE_CLIENT_ID`: enables Google sign-in when set
/// - `RESET_TOKEN_TTL_MINUTES`: password reset token lifetime (default 30)
/// - `RESET_PASSWORD_URL`: base URL the reset token is appended to
///
/// # Example
///
/// ```no_run
/// use powercoffee_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use std::env;
use std::str::FromStr;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub identity: IdentitySettings,
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Turns on HSTS
    pub production: bool,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone)]
pub struct JwtConfig {
    /// Generate with `openssl rand -hex 32`
    pub secret: String,

    pub expiration_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_hours", &self.expiration_hours)
            .finish()
    }
}

/// Password reset and external sign-in settings
#[derive(Debug, Clone)]
pub struct IdentitySettings {
    /// Google OAuth client id; Google sign-in is rejected when unset
    pub google_client_id: Option<String>,

    pub reset_token_ttl_minutes: i64,

    pub reset_password_url: String,
}

const MIN_JWT_SECRET_LEN: usize = 32;

fn var_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value")),
        _ => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Fails when a required variable is missing, a value does not parse,
    /// or `JWT_SECRET` is shorter than 32 characters.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {MIN_JWT_SECRET_LEN} characters long");
        }

        let cors_origins = parse_origins(
            &env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()),
        );

        let config = Self {
            api: ApiConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: var_or("API_PORT", 8080)?,
                production: var_or("API_PRODUCTION", false)?,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: var_or("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiration_hours: var_or("JWT_EXPIRATION_HOURS", 24)?,
            },
            identity: IdentitySettings {
                google_client_id: env::var("GOOGLE_CLIENT_ID")
                    .ok()
                    .filter(|id| !id.trim().is_empty()),
                reset_token_ttl_minutes: var_or("RESET_TOKEN_TTL_MINUTES", 30)?,
                reset_password_url: env::var("RESET_PASSWORD_URL").unwrap_or_else(|_| {
                    "http://localhost:3000/reset-password".to_string()
                }),
            },
        };

        if config.jwt.expiration_hours <= 0 {
            anyhow::bail!("JWT_EXPIRATION_HOURS must be positive");
        }
        if config.identity.reset_token_ttl_minutes <= 0 {
            anyhow::bail!("RESET_TOKEN_TTL_MINUTES must be positive");
        }

        Ok(config)
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Whether any origin may call the API
    pub fn cors_allows_any(&self) -> bool {
        self.api.cors_origins.iter().any(|o| o == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                production: false,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                expiration_hours: 24,
            },
            identity: IdentitySettings {
                google_client_id: None,
                reset_token_ttl_minutes: 30,
                reset_password_url: "http://localhost:3000/reset-password".to_string(),
            },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("https://a.io, https://b.io,,"),
            vec!["https://a.io".to_string(), "https://b.io".to_string()]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_cors_allows_any() {
        let mut cfg = config();
        assert!(cfg.cors_allows_any());

        cfg.api.cors_origins = vec!["https://powercoffee.app".to_string()];
        assert!(!cfg.cors_allows_any());
    }

    #[test]
    fn test_jwt_secret_is_redacted() {
        let rendered = format!("{:?}", config().jwt);
        assert!(!rendered.contains("test-secret"));
    }
}
