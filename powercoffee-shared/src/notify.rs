//! Password reset delivery
//!
//! The workflow hands a freshly issued reset token to a [`ResetNotifier`].
//! The shipped implementation writes the reset link to the log; mail
//! delivery plugs in behind the same trait.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::user::User;

#[derive(Debug, thiserror::Error)]
#[error("Failed to deliver reset token: {0}")]
pub struct NotifyError(pub String);

/// Delivers reset tokens to users
#[async_trait]
pub trait ResetNotifier: Send + Sync {
    async fn send_reset_token(
        &self,
        user: &User,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), NotifyError>;
}

/// Logs the reset link instead of sending it
///
/// The info line carries only a redacted link. The usable link is emitted at
/// debug level, and only when the notifier was built with `expose_links`.
#[derive(Debug, Clone)]
pub struct TracingNotifier {
    reset_url: String,
    expose_links: bool,
}

impl TracingNotifier {
    /// `reset_url` is the front-end page the token is appended to
    pub fn new(reset_url: impl Into<String>, expose_links: bool) -> Self {
        Self {
            reset_url: reset_url.into(),
            expose_links,
        }
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/{}", self.reset_url.trim_end_matches('/'), token)
    }

    /// Reset link with all but the first four token characters masked
    pub fn redacted_link(&self, token: &str) -> String {
        let visible: String = token.chars().take(4).collect();
        self.reset_link(&format!("{visible}****"))
    }
}

#[async_trait]
impl ResetNotifier for TracingNotifier {
    async fn send_reset_token(
        &self,
        user: &User,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            user_id = %user.id,
            link = %self.redacted_link(token),
            %expires_at,
            "Password reset requested"
        );
        if self.expose_links {
            tracing::debug!(user_id = %user.id, link = %self.reset_link(token), "Reset link");
        }
        Ok(())
    }
}

/// Records every token it is asked to send
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(email, token)` pairs in send order
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Most recent token sent to `email`
    pub fn last_token_for(&self, email: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, token)| token)
    }
}

#[async_trait]
impl ResetNotifier for MemoryNotifier {
    async fn send_reset_token(
        &self,
        user: &User,
        token: &str,
        _expires_at: DateTime<Utc>,
    ) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((user.email.clone(), token.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_link() {
        let notifier = TracingNotifier::new("https://app.example.com/reset-password/", false);
        assert_eq!(
            notifier.reset_link("abc"),
            "https://app.example.com/reset-password/abc"
        );
    }

    #[test]
    fn test_redacted_link_hides_token() {
        let notifier = TracingNotifier::new("https://app.example.com/reset-password", false);
        let token = "0123456789abcdef0123456789abcdef";

        let link = notifier.redacted_link(token);
        assert_eq!(link, "https://app.example.com/reset-password/0123****");
        assert!(!link.contains(token));
        assert_eq!(
            notifier.redacted_link("ab"),
            "https://app.example.com/reset-password/ab****"
        );
    }
}
