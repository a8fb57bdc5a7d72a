/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with all
/// routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use cinevault_api::{app::AppState, config::Config};
/// use cinevault_shared::db::pool::{create_pool, DatabaseConfig};
/// use cinevault_shared::store::postgres::{PgAppStore, PgIdentityStore};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
///
/// let state = AppState::new(
///     pool.clone(),
///     Arc::new(PgIdentityStore::new(pool.clone())),
///     Arc::new(PgAppStore::new(pool)),
///     config,
/// );
/// let app = cinevault_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use cinevault_shared::auth::middleware::bearer_auth_middleware;
use cinevault_shared::auth::service::{AuthConfig, AuthService};
use cinevault_shared::store::{AppStore, IdentityStore};
use cinevault_shared::subscription::SubscriptionManager;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned per request via Axum's `State` extractor; everything inside is an
/// Arc or a pool handle, so clones are cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (health checks)
    pub db: PgPool,

    /// Auth service over the two stores
    pub auth: AuthService,

    /// Subscription manager
    pub subscriptions: SubscriptionManager,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the services from the stores and configuration
    pub fn new(
        db: PgPool,
        identity: Arc<dyn IdentityStore>,
        store: Arc<dyn AppStore>,
        config: Config,
    ) -> Self {
        let auth = AuthService::new(
            identity,
            store.clone(),
            AuthConfig {
                admin_email: config.auth.admin_email.clone(),
                provider_timeout: config.provider_timeout(),
            },
        );
        let subscriptions = SubscriptionManager::new(store, config.provider_timeout());

        Self {
            db,
            auth,
            subscriptions,
            config: Arc::new(config),
        }
    }

    /// JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router
///
/// ```text
/// /
/// ├── /health                          # public
/// └── /v1/
///     ├── /auth/
///     │   ├── POST /register           # public
///     │   ├── POST /login              # public
///     │   ├── POST /password-reset     # public
///     │   ├── POST /logout             # bearer
///     │   ├── PUT  /password           # bearer
///     │   ├── PUT  /profile            # bearer
///     │   └── GET  /me                 # bearer
///     ├── /subscriptions/
///     │   ├── POST /                   # bearer
///     │   ├── POST /cancel             # bearer
///     │   └── GET  /                   # bearer
///     ├── /billing/
///     │   └── POST /webhook            # HMAC-signed
///     └── /admin/
///         ├── POST /creators/:id/approve   # bearer + admin
///         └── POST /creators/:id/reject    # bearer + admin
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public auth endpoints
    let auth_public = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/password-reset", post(routes::auth::request_password_reset));

    // Session-bound auth endpoints
    let auth_protected = Router::new()
        .route("/logout", post(routes::auth::logout))
        .route("/password", put(routes::auth::reset_password))
        .route("/profile", put(routes::auth::update_profile))
        .route("/me", get(routes::auth::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_layer,
        ));

    // Back-office; handlers enforce the admin role on top of the bearer layer
    let admin_routes = Router::new()
        .route(
            "/creators/:account_id/approve",
            post(routes::admin::approve_creator),
        )
        .route(
            "/creators/:account_id/reject",
            post(routes::admin::reject_creator),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_layer,
        ));

    let subscription_routes = Router::new()
        .route("/", post(routes::subscription::create_subscription))
        .route("/", get(routes::subscription::list_subscriptions))
        .route("/cancel", post(routes::subscription::cancel_subscription))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_layer,
        ));

    // Webhook authenticates via HMAC signature, not bearer tokens
    let billing_routes =
        Router::new().route("/webhook", post(routes::billing::payment_webhook));

    let v1_routes = Router::new()
        .nest("/auth", auth_public.merge(auth_protected))
        .nest("/subscriptions", subscription_routes)
        .nest("/billing", billing_routes)
        .nest("/admin", admin_routes);

    // CORS: permissive in development, explicit origins in production
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
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
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Bearer authentication middleware layer
///
/// Validates the bearer token and injects `AuthContext` into request
/// extensions for downstream handlers.
async fn bearer_auth_layer(
    state: axum::extract::State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, cinevault_shared::auth::middleware::AuthLayerError> {
    bearer_auth_middleware(state.jwt_secret().to_string(), req, next).await
}
