//! Auth gate
//!
//! Login/logout handlers plus the two middleware layers: `require_session`
//! resolves the session cookie to a [`CurrentUser`] request extension,
//! `require_admin` additionally checks the role tag.
//!
//! The account is re-read from the database on every request, so a deleted
//! account loses access immediately.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use rfdash_common::db::accounts::{authenticate, get_account, Account};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::UiResult;
use crate::session::{expired_session_cookie, session_cookie, token_from_headers, Flash};
use crate::ui::{escape_html, render_bare_page};
use crate::AppState;

/// Identity of the logged-in user, attached to each authenticated request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub account: Account,
    /// Session token (for flash messages)
    pub token: String,
}

/// Login form fields
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

fn login_form(flashes: &[Flash], username: &str) -> Html<String> {
    let body = format!(
        r#"<form method="post" action="/login">
    <label for="username">Username</label>
    <input id="username" name="username" value="{}" autofocus required>
    <label for="password">Password</label>
    <input id="password" name="password" type="password" required>
    <p><button type="submit">Log in</button></p>
</form>"#,
        escape_html(username)
    );
    render_bare_page("Login", flashes, &body)
}

/// GET /login
pub async fn login_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = token_from_headers(&headers, &state.config.secret_key) {
        if state.sessions.account_id(&token).await.is_some() {
            return Redirect::to("/").into_response();
        }
    }
    login_form(&[], "").into_response()
}

/// POST /login
///
/// Success always issues a fresh session token; any session presented with
/// the request is discarded.
pub async fn login_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> UiResult<Response> {
    let Some(account) = authenticate(&state.db, &form.username, &form.password).await? else {
        warn!("Failed login attempt for '{}'", form.username.trim());
        let flashes = [Flash::error("Invalid username or password")];
        return Ok(login_form(&flashes, form.username.trim()).into_response());
    };

    if let Some(previous) = token_from_headers(&headers, &state.config.secret_key) {
        state.sessions.remove(&previous).await;
    }

    let token = state.sessions.create(account.id).await;
    state
        .sessions
        .push_flash(&token, Flash::success(format!("Welcome, {}", account.username)))
        .await;
    info!("User '{}' logged in", account.username);

    Ok((
        [(header::SET_COOKIE, session_cookie(&token, &state.config.secret_key))],
        Redirect::to("/"),
    )
        .into_response())
}

/// GET /logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = token_from_headers(&headers, &state.config.secret_key) {
        state.sessions.remove(&token).await;
    }
    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Redirect::to("/login"),
    )
        .into_response()
}

/// Session middleware
///
/// Missing, forged or stale sessions redirect to `/login`.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> UiResult<Response> {
    let Some(token) = token_from_headers(request.headers(), &state.config.secret_key) else {
        return Ok(Redirect::to("/login").into_response());
    };

    let Some(account_id) = state.sessions.account_id(&token).await else {
        debug!("Unknown session token presented");
        return Ok(Redirect::to("/login").into_response());
    };

    let Some(account) = get_account(&state.db, account_id).await? else {
        // Account deleted while logged in
        state.sessions.remove(&token).await;
        return Ok(Redirect::to("/login").into_response());
    };

    request.extensions_mut().insert(CurrentUser { account, token });
    Ok(next.run(request).await)
}

/// Admin middleware; must run inside [`require_session`]
pub async fn require_admin(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    request: Request,
    next: Next,
) -> Response {
    if user.account.is_admin() {
        return next.run(request).await;
    }

    warn!(
        "User '{}' denied access to {}",
        user.account.username,
        request.uri().path()
    );
    state
        .sessions
        .push_flash(&user.token, Flash::error("Administrator access required"))
        .await;
    Redirect::to("/").into_response()
}
