/// Application state, router builder, and the authentication gate
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use noteleaf_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = noteleaf_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use noteleaf_shared::auth::jwt;
use noteleaf_shared::models::user::User;
use noteleaf_shared::storage::AttachmentStore;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Attachment file store
    pub storage: AttachmentStore,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        let storage = AttachmentStore::new(&config.storage.upload_dir);
        Self {
            db,
            config: Arc::new(config),
            storage,
        }
    }

    /// Gets the secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /v1/                             # API v1 (versioned)
///     ├── POST /auth/token             # Login, form-encoded (public)
///     ├── POST /users                  # Registration (public)
///     ├── /users/...                   # Profile + admin management (bearer)
///     ├── /categories/...              # Category CRUD (bearer, admin writes)
///     ├── /notes/...                   # Notes, search, sharing (bearer)
///     └── /attachments/...             # Attachment access by id (bearer)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Bearer authentication, on the protected routes only
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public v1 endpoints: login and registration
    let public_routes = Router::new()
        .route("/auth/token", post(routes::auth::issue_token))
        .route("/users", post(routes::users::register));

    // Everything else requires a valid bearer token
    let protected_routes = Router::new()
        .route("/users", get(routes::users::list_users))
        .route(
            "/users/me",
            get(routes::users::get_me).put(routes::users::update_me),
        )
        .route(
            "/users/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route(
            "/categories",
            get(routes::categories::list_categories).post(routes::categories::create_category),
        )
        .route(
            "/categories/:id",
            get(routes::categories::get_category)
                .put(routes::categories::update_category)
                .delete(routes::categories::delete_category),
        )
        .route(
            "/notes",
            get(routes::notes::list_notes).post(routes::notes::create_note),
        )
        .route("/notes/search/:text", get(routes::notes::search_notes))
        .route(
            "/notes/:id",
            get(routes::notes::get_note)
                .put(routes::notes::update_note)
                .delete(routes::notes::delete_note),
        )
        .route(
            "/notes/:id/share/:user_id",
            post(routes::notes::share_note).delete(routes::notes::unshare_note),
        )
        .route(
            "/notes/:id/attachments",
            get(routes::attachments::list_attachments)
                .post(routes::attachments::upload_attachment),
        )
        .route(
            "/attachments/:id",
            get(routes::attachments::get_attachment)
                .delete(routes::attachments::delete_attachment),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_layer,
        ));

    let v1_routes = public_routes.merge(protected_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bearer authentication middleware
///
/// Validates the token from the Authorization header, loads the account
/// behind its subject, and injects it into request extensions for the
/// `CurrentUser`/`AdminUser` extractors.
///
/// A valid token for a deactivated account is 403, not 401; the
/// credential verified fine, the account just may not act.
async fn bearer_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    use crate::error::ApiError;

    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;

    let user = User::find_by_username(&state.db, &claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown account".to_string()))?;

    if !user.is_active {
        return Err(ApiError::Forbidden("Account is deactivated".to_string()));
    }

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
