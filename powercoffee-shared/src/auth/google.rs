/// External identity assertions (Google sign-in)
///
/// A client obtains a Google ID token in the browser and posts it to the
/// API. [`GoogleIdentityProvider`] asks Google's `tokeninfo` endpoint to
/// decode and verify it, then checks the audience, issuer, expiry and
/// email-verified flag locally before trusting the asserted email.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

/// Google's ID token introspection endpoint
pub const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

const GOOGLE_ISSUERS: &[&str] = &["accounts.google.com", "https://accounts.google.com"];

#[derive(Debug, thiserror::Error)]
pub enum ExternalIdentityError {
    /// No provider is configured
    #[error("External sign-in is not enabled")]
    Disabled,

    /// The assertion was decoded but fails a check
    #[error("Identity assertion rejected: {0}")]
    Rejected(String),

    /// The provider could not be reached or answered garbage
    #[error("Identity provider request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Identity asserted by an external provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub email: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

/// Validates third-party identity assertions
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, assertion: &str) -> Result<ExternalIdentity, ExternalIdentityError>;
}

/// Decoded payload returned by the tokeninfo endpoint
///
/// Google returns every field as a JSON string, including booleans and timestamps.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    pub aud: String,
    pub iss: String,
    pub exp: String,
    pub email: Option<String>,
    pub email_verified: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

impl TokenInfo {
    /// Applies the local checks to a decoded token
    pub fn into_identity(
        self,
        client_id: &str,
        now_unix: i64,
    ) -> Result<ExternalIdentity, ExternalIdentityError> {
        if self.aud != client_id {
            return Err(ExternalIdentityError::Rejected("audience mismatch".to_string()));
        }

        if !GOOGLE_ISSUERS.contains(&self.iss.as_str()) {
            return Err(ExternalIdentityError::Rejected(format!(
                "unexpected issuer {}",
                self.iss
            )));
        }

        let exp: i64 = self
            .exp
            .parse()
            .map_err(|_| ExternalIdentityError::Rejected("malformed expiry".to_string()))?;
        if exp <= now_unix {
            return Err(ExternalIdentityError::Rejected("token expired".to_string()));
        }

        if self.email_verified.as_deref() != Some("true") {
            return Err(ExternalIdentityError::Rejected("email not verified".to_string()));
        }

        let email = self
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ExternalIdentityError::Rejected("no email in assertion".to_string()))?;

        Ok(ExternalIdentity {
            email,
            given_name: self.given_name,
            family_name: self.family_name,
        })
    }
}

/// Google ID token verifier
#[derive(Debug, Clone)]
pub struct GoogleIdentityProvider {
    client: reqwest::Client,
    client_id: String,
    tokeninfo_url: String,
}

impl GoogleIdentityProvider {
    pub fn new(client_id: impl Into<String>) -> Result<Self, ExternalIdentityError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            client_id: client_id.into(),
            tokeninfo_url: GOOGLE_TOKENINFO_URL.to_string(),
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    #[instrument(skip(self, assertion))]
    async fn verify(&self, assertion: &str) -> Result<ExternalIdentity, ExternalIdentityError> {
        let response = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", assertion)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, "Google rejected ID token");
            return Err(ExternalIdentityError::Rejected(format!(
                "provider answered {status}"
            )));
        }

        let info: TokenInfo = response.json().await?;
        info.into_identity(&self.client_id, Utc::now().timestamp())
    }
}

/// Provider used when no Google client ID is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledIdentityProvider;

#[async_trait]
impl IdentityProvider for DisabledIdentityProvider {
    async fn verify(&self, _assertion: &str) -> Result<ExternalIdentity, ExternalIdentityError> {
        Err(ExternalIdentityError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENT_ID: &str = "client-123.apps.googleusercontent.com";
    const NOW: i64 = 1_700_000_000;

    fn info() -> TokenInfo {
        TokenInfo {
            aud: CLIENT_ID.to_string(),
            iss: "https://accounts.google.com".to_string(),
            exp: (NOW + 600).to_string(),
            email: Some("alice@example.com".to_string()),
            email_verified: Some("true".to_string()),
            given_name: Some("Alice".to_string()),
            family_name: Some("Liddell".to_string()),
        }
    }

    #[test]
    fn test_valid_assertion() {
        let identity = info().into_identity(CLIENT_ID, NOW).unwrap();
        assert_eq!(identity.email, "alice@example.com");
        assert_eq!(identity.given_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_wrong_audience() {
        let result = info().into_identity("someone-else", NOW);
        assert!(matches!(result, Err(ExternalIdentityError::Rejected(_))));
    }

    #[test]
    fn test_wrong_issuer() {
        let mut info = info();
        info.iss = "evil.example.com".to_string();
        assert!(info.into_identity(CLIENT_ID, NOW).is_err());
    }

    #[test]
    fn test_expired() {
        let mut info = info();
        info.exp = NOW.to_string();
        assert!(info.into_identity(CLIENT_ID, NOW).is_err());
    }

    #[test]
    fn test_unverified_email() {
        let mut info = info();
        info.email_verified = Some("false".to_string());
        assert!(info.into_identity(CLIENT_ID, NOW).is_err());

        let mut info = self::info();
        info.email = None;
        assert!(info.into_identity(CLIENT_ID, NOW).is_err());
    }

    #[test]
    fn test_tokeninfo_deserializes_string_fields() {
        let json = r#"{
            "aud": "client-123.apps.googleusercontent.com",
            "iss": "accounts.google.com",
            "exp": "1700000600",
            "email": "alice@example.com",
            "email_verified": "true",
            "sub": "1098"
        }"#;
        let info: TokenInfo = serde_json::from_str(json).unwrap();
        assert!(info.into_identity(CLIENT_ID, NOW).is_ok());
    }

    #[tokio::test]
    async fn test_disabled_provider() {
        let result = DisabledIdentityProvider.verify("anything").await;
        assert!(matches!(result, Err(ExternalIdentityError::Disabled)));
    }
}
