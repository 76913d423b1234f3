//! Shared harness for API integration tests
//!
//! Builds the real router over in-memory stores, a cheap Argon2 hasher and a
//! recording notifier, so tests exercise every layer except PostgreSQL.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use powercoffee_api::app::{build_router, AppState};
use powercoffee_api::config::{ApiConfig, Config, DatabaseConfig, IdentitySettings, JwtConfig};
use powercoffee_shared::auth::google::DisabledIdentityProvider;
use powercoffee_shared::auth::jwt::{JwtIssuer, TokenIssuer};
use powercoffee_shared::auth::password::Argon2Hasher;
use powercoffee_shared::identity::{IdentityConfig, IdentityDeps, IdentityService};
use powercoffee_shared::notify::MemoryNotifier;
use powercoffee_shared::shops::ShopService;
use powercoffee_shared::store::memory::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const PASSWORD: &str = "secret123";

pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<MemoryNotifier>,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            production: false,
            cors_origins: vec!["*".to_string()],
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
            expiration_hours: 1,
        },
        identity: IdentitySettings {
            google_client_id: None,
            reset_token_ttl_minutes: 30,
            reset_password_url: "http://localhost:3000/reset-password".to_string(),
        },
    }
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(MemoryNotifier::new());
        let tokens: Arc<dyn TokenIssuer> =
            Arc::new(JwtIssuer::new(JWT_SECRET, Duration::hours(1)));

        let identity = IdentityService::new(
            IdentityDeps {
                users: store.clone(),
                roles: store.clone(),
                hasher: Arc::new(Argon2Hasher::with_params(8, 1, 1)),
                tokens: tokens.clone(),
                identity_provider: Arc::new(DisabledIdentityProvider),
                notifier: notifier.clone(),
            },
            IdentityConfig::default(),
        );
        let shops = ShopService::new(store.clone());

        let state = AppState::from_parts(identity, shops, tokens, test_config());

        Self {
            app: build_router(state),
            store,
            notifier,
        }
    }

    /// Sends one request and returns the status plus the JSON body
    /// (`Value::Null` for an empty body)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }

    /// Registers a user with the given roles (`None` = default)
    pub async fn signup(&self, username: &str, roles: Option<Vec<&str>>) -> (StatusCode, Value) {
        let mut body = json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "phoneNumber": format!("+387-{username}"),
            "firstName": "Test",
            "lastName": "User",
            "password": PASSWORD,
        });
        if let Some(roles) = roles {
            body["role"] = json!(roles);
        }

        self.send(Method::POST, "/api/users/signup", None, Some(body))
            .await
    }

    pub async fn signin(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/users/signin",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    /// Signs up and signs in, returning `(user id, token)`
    pub async fn register(&self, username: &str, roles: Option<Vec<&str>>) -> (String, String) {
        let (status, body) = self.signup(username, roles).await;
        assert_eq!(status, StatusCode::OK, "signup failed: {body}");

        let (status, body) = self.signin(username, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "signin failed: {body}");

        (
            body["id"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }
}
