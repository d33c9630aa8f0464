//! rfdash-ui library - RF dashboard web server
//!
//! Role-gated dashboard over the RF record store: login, report pages,
//! spreadsheet import and account administration.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use rfdash_common::config::DashboardConfig;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod pagination;
pub mod session;
pub mod ui;

pub use crate::error::{UiError, UiResult};

use crate::session::SessionStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Logged-in sessions
    pub sessions: SessionStore,
    /// Resolved configuration (secret key, upload limit, hash cost)
    pub config: Arc<DashboardConfig>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, config: DashboardConfig) -> Self {
        Self {
            db,
            sessions: SessionStore::new(),
            config: Arc::new(config),
        }
    }
}

/// Build application router
///
/// - `/login`, `/logout`, `/health`: no session required
/// - report, import and profile pages: session required
/// - `/users*`: session plus admin role
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    let admin = Router::new()
        .route("/users", get(api::list_users))
        .route("/users/add", post(api::add_user))
        .route("/users/delete/:id", get(api::delete_user).post(api::delete_user))
        .route("/users/reset-pass/:id", post(api::reset_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_admin,
        ));

    // Session check wraps the admin check
    let protected = Router::new()
        .route("/", get(api::dashboard))
        .route("/kpi", get(api::kpi_page))
        .route("/rf", get(api::rf_page))
        .route("/poi", get(api::poi_page))
        .route("/worst-cell", get(api::worst_cell_page))
        .route("/conges-3g", get(api::conges_3g_page))
        .route("/traffic-down", get(api::traffic_down_page))
        .route("/script", get(api::script_page))
        .route("/import", get(api::import_form).post(api::import_submit))
        .route("/profile", get(api::profile_page))
        .route("/change-password", post(api::change_password))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_session,
        ));

    let public = Router::new()
        .route("/login", get(api::login_page).post(api::login_submit))
        .route("/logout", get(api::logout))
        .merge(api::health_routes());

    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
