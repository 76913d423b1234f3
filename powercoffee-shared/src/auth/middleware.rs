/// Authentication middleware for Axum
///
/// Validates `Authorization: Bearer <jwt>` headers and inserts an
/// [`AuthContext`] into the request extensions. The context lives only as
/// long as the request; handlers read it with `Extension<AuthContext>`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{middleware, routing::get, Extension, Router};
/// use chrono::Duration;
/// use powercoffee_shared::auth::jwt::{JwtIssuer, TokenIssuer};
/// use powercoffee_shared::auth::middleware::{jwt_auth_middleware, AuthContext};
///
/// async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
///     auth.username
/// }
///
/// let tokens: Arc<dyn TokenIssuer> =
///     Arc::new(JwtIssuer::new("your-secret-key-at-least-32-bytes", Duration::hours(24)));
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn_with_state(tokens, jwt_auth_middleware));
/// ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{Claims, JwtError, TokenIssuer};
use crate::models::role::RoleName;

/// Authenticated principal for one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub username: String,

    /// Roles carried by the token; unknown names are dropped
    pub roles: Vec<RoleName>,
}

impl AuthContext {
    pub fn from_claims(claims: Claims) -> Self {
        let roles = claims
            .roles
            .iter()
            .filter_map(|name| RoleName::from_name(name))
            .collect();

        Self {
            user_id: claims.sub,
            username: claims.username,
            roles,
        }
    }

    pub fn has_role(&self, role: RoleName) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[RoleName]) -> bool {
        roles.iter().any(|r| self.has_role(*r))
    }
}

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),
}

impl AuthError {
    fn message(&self) -> String {
        match self {
            AuthError::MissingCredentials => "Missing credentials".to_string(),
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": "unauthorized",
            "message": self.message(),
        });

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
            _ => AuthError::InvalidToken("Invalid token".to_string()),
        }
    }
}

/// Pulls the token out of an `Authorization` header value
pub fn bearer_token(header_value: &str) -> Result<&str, AuthError> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// JWT authentication middleware
///
/// Use with `axum::middleware::from_fn_with_state`, passing the token issuer
/// as state. Rejects with 401 when the header is missing, malformed, or the
/// token fails validation.
pub async fn jwt_auth_middleware(
    State(tokens): State<Arc<dyn TokenIssuer>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = bearer_token(auth_header)?;

    let claims = tokens.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AuthError::from(e)
    })?;

    req.extensions_mut().insert(AuthContext::from_claims(claims));

    Ok(next.run(req).await)
}
