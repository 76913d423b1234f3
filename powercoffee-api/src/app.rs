/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use powercoffee_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config)?;
/// let app = powercoffee_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use chrono::Duration;
use powercoffee_shared::auth::google::{
    DisabledIdentityProvider, GoogleIdentityProvider, IdentityProvider,
};
use powercoffee_shared::auth::jwt::{JwtIssuer, TokenIssuer};
use powercoffee_shared::auth::middleware::jwt_auth_middleware;
use powercoffee_shared::auth::password::Argon2Hasher;
use powercoffee_shared::identity::{IdentityConfig, IdentityDeps, IdentityService};
use powercoffee_shared::notify::TracingNotifier;
use powercoffee_shared::shops::ShopService;
use powercoffee_shared::store::postgres::PgStore;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler; all fields are reference counted.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<IdentityService>,
    pub shops: Arc<ShopService>,

    /// Verifies bearer tokens in the auth middleware
    pub tokens: Arc<dyn TokenIssuer>,

    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the production collaborators over a PostgreSQL pool
    ///
    /// # Errors
    ///
    /// Fails only when the Google HTTP client cannot be built.
    pub fn new(pool: PgPool, config: Config) -> anyhow::Result<Self> {
        let store = Arc::new(PgStore::new(pool));
        let tokens: Arc<dyn TokenIssuer> = Arc::new(JwtIssuer::new(
            config.jwt.secret.clone(),
            Duration::hours(config.jwt.expiration_hours),
        ));

        let identity_provider: Arc<dyn IdentityProvider> =
            match &config.identity.google_client_id {
                Some(client_id) => Arc::new(GoogleIdentityProvider::new(client_id.clone())?),
                None => {
                    tracing::warn!("GOOGLE_CLIENT_ID not set; Google sign-in is disabled");
                    Arc::new(DisabledIdentityProvider)
                }
            };

        let identity = IdentityService::new(
            IdentityDeps {
                users: store.clone(),
                roles: store.clone(),
                hasher: Arc::new(Argon2Hasher::new()),
                tokens: tokens.clone(),
                identity_provider,
                notifier: Arc::new(TracingNotifier::new(
                    config.identity.reset_password_url.clone(),
                    !config.api.production,
                )),
            },
            IdentityConfig {
                reset_token_ttl: Duration::minutes(config.identity.reset_token_ttl_minutes),
            },
        );
        let shops = ShopService::new(store);

        Ok(Self::from_parts(identity, shops, tokens, config))
    }

    /// Assembles state from already-built services
    pub fn from_parts(
        identity: IdentityService,
        shops: ShopService,
        tokens: Arc<dyn TokenIssuer>,
        config: Config,
    ) -> Self {
        Self {
            identity: Arc::new(identity),
            shops: Arc::new(shops),
            tokens,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete router
///
/// ```text
/// /health                                         public
/// /api/users/signup | signin | auth/google        public
/// /api/users/forgot-password                      public
/// /api/users/reset-password/:token                public (GET check, PATCH reset)
/// /api/users, /api/users/:id, get-by-email/:email bearer token
/// /api/coffee-shops/...                           bearer token
/// ```
///
/// Layers, outermost first: security headers, CORS, request tracing.
pub fn build_router(state: AppState) -> Router {
    let auth = from_fn_with_state(state.tokens.clone(), jwt_auth_middleware);

    let public_user_routes = Router::new()
        .route("/signup", post(routes::users::signup))
        .route("/signin", post(routes::users::signin))
        .route("/auth/google", post(routes::users::google_signin))
        .route("/forgot-password", post(routes::users::forgot_password))
        .route(
            "/reset-password/:token",
            get(routes::users::check_reset_token).patch(routes::users::reset_password),
        );

    let protected_user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route(
            "/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user)
                .patch(routes::users::change_password),
        )
        .route("/get-by-email/:email", get(routes::users::get_user_by_email))
        .layer(auth.clone());

    let shop_routes = Router::new()
        .route(
            "/",
            get(routes::coffee_shops::list_shops).post(routes::coffee_shops::create_shop),
        )
        .route(
            "/:id",
            get(routes::coffee_shops::get_shop)
                .put(routes::coffee_shops::update_shop)
                .delete(routes::coffee_shops::delete_shop),
        )
        .route(
            "/:id/categories",
            get(routes::coffee_shops::list_categories)
                .post(routes::coffee_shops::create_category),
        )
        .route(
            "/:id/categories/:category_id",
            axum::routing::delete(routes::coffee_shops::delete_category),
        )
        .route(
            "/:id/products",
            get(routes::coffee_shops::list_products).post(routes::coffee_shops::create_product),
        )
        .route(
            "/:id/products/:product_id",
            get(routes::coffee_shops::get_product)
                .put(routes::coffee_shops::update_product)
                .delete(routes::coffee_shops::delete_product),
        )
        .route(
            "/:id/employees",
            get(routes::people::list_employees).post(routes::people::create_employee),
        )
        .route(
            "/:id/employees/:employee_id",
            get(routes::people::get_employee)
                .put(routes::people::update_employee)
                .delete(routes::people::delete_employee),
        )
        .route(
            "/:id/customers",
            get(routes::people::list_customers).post(routes::people::create_customer),
        )
        .route(
            "/:id/customers/:customer_id",
            get(routes::people::get_customer)
                .put(routes::people::update_customer)
                .delete(routes::people::delete_customer),
        )
        .route(
            "/:id/suppliers",
            get(routes::people::list_suppliers).post(routes::people::create_supplier),
        )
        .route(
            "/:id/suppliers/:supplier_id",
            get(routes::people::get_supplier)
                .put(routes::people::update_supplier)
                .delete(routes::people::delete_supplier),
        )
        .route(
            "/:id/orders",
            get(routes::orders::list_orders).post(routes::orders::create_order),
        )
        .route(
            "/:id/orders/:order_id",
            get(routes::orders::get_order)
                .put(routes::orders::update_order)
                .delete(routes::orders::delete_order),
        )
        .layer(auth);

    let api_routes = Router::new()
        .nest(
            "/users",
            public_user_routes.merge(protected_user_routes),
        )
        .nest("/coffee-shops", shop_routes);

    let cors = if state.config.cors_allows_any() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let production = state.config.api.production;

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}
