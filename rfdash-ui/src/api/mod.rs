//! HTTP handlers for rfdash-ui

pub mod auth;
pub mod health;
pub mod import;
pub mod pages;
pub mod profile;
pub mod users;

pub use auth::{login_page, login_submit, logout, require_admin, require_session, CurrentUser};
pub use health::health_routes;
pub use import::{import_form, import_submit};
pub use pages::{
    conges_3g_page, dashboard, kpi_page, poi_page, rf_page, script_page, traffic_down_page,
    worst_cell_page,
};
pub use profile::{change_password, profile_page};
pub use users::{add_user, delete_user, list_users, reset_password};

use crate::session::Flash;
use crate::ui::PageContext;
use crate::AppState;
use axum::response::{IntoResponse, Redirect, Response};

/// Build the render context for the current user, draining pending flashes
async fn page_context<'a>(
    state: &AppState,
    user: &'a CurrentUser,
    title: &'a str,
    active: &'a str,
) -> PageContext<'a> {
    PageContext {
        title,
        active,
        user: &user.account,
        flashes: state.sessions.take_flashes(&user.token).await,
    }
}

/// Queue a flash message and redirect (post/redirect/get)
async fn flash_redirect(state: &AppState, user: &CurrentUser, flash: Flash, to: &str) -> Response {
    state.sessions.push_flash(&user.token, flash).await;
    Redirect::to(to).into_response()
}
