/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use choreboard_api::{app::{build_router, AppState}, config::Config};
/// use choreboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
/// let app = build_router(AppState::new(pool, config));
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{security::SecurityHeadersLayer, session::require_session},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|o| o == "*") {
        // credentials can't be combined with a wildcard origin, so mirror it
        return CorsLayer::very_permissive();
    }

    let origins: Vec<HeaderValue> = config
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
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::COOKIE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Builds the complete router
///
/// ```text
/// /
/// ├── GET  /health
/// ├── /auth            ?action=register|login|logout|check|profile
/// └── (session required)
///     ├── /tasks          GET list|?id=|?id=&action=history, POST, PUT, DELETE ?id=
///     ├── /categories     GET, POST, PUT, DELETE ?id=
///     ├── /teams          GET [?id=&action=members], POST [?action=...], PUT/DELETE ?id=
///     └── /notifications  GET [?unread=1], PUT ?id=|?action=read_all, DELETE ?id=
/// ```
///
/// `/auth` resolves the session itself since register, login and check are
/// public.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/auth",
            get(routes::auth::get_action)
                .post(routes::auth::post_action)
                .put(routes::auth::put_action),
        );

    let protected = Router::new()
        .route(
            "/tasks",
            get(routes::tasks::get_tasks)
                .post(routes::tasks::create_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/categories",
            get(routes::categories::list_categories)
                .post(routes::categories::create_category)
                .put(routes::categories::update_category)
                .delete(routes::categories::delete_category),
        )
        .route(
            "/teams",
            get(routes::teams::get_teams)
                .post(routes::teams::post_action)
                .put(routes::teams::update_team)
                .delete(routes::teams::delete_team),
        )
        .route(
            "/notifications",
            get(routes::notifications::list_notifications)
                .put(routes::notifications::mark_read)
                .delete(routes::notifications::delete_notification),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
