//! Self-service profile and password change

use axum::{
    extract::State,
    response::{Html, Response},
    Extension, Form,
};
use rfdash_common::auth::validate_password;
use rfdash_common::db::accounts::{set_password, verify_account_password};
use serde::Deserialize;
use tracing::{info, warn};

use super::{flash_redirect, page_context, CurrentUser};
use crate::error::UiResult;
use crate::session::Flash;
use crate::ui::{escape_html, render_page};
use crate::AppState;

/// GET /profile
pub async fn profile_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Html<String> {
    let account = &user.account;
    let body = format!(
        r#"<table>
<tr><th>Username</th><td>{username}</td></tr>
<tr><th>Role</th><td>{role}</td></tr>
<tr><th>Created</th><td>{created}</td></tr>
</table>
<h2>Change password</h2>
<form method="post" action="/change-password">
    <label for="current_password">Current password</label>
    <input id="current_password" name="current_password" type="password" required>
    <label for="new_password">New password</label>
    <input id="new_password" name="new_password" type="password" required>
    <label for="confirm_password">Confirm new password</label>
    <input id="confirm_password" name="confirm_password" type="password" required>
    <p><button type="submit">Change password</button></p>
</form>"#,
        username = escape_html(&account.username),
        role = account.role.as_str(),
        created = account.created_at.format("%Y-%m-%d %H:%M"),
    );

    let ctx = page_context(&state, &user, "Profile", "profile").await;
    render_page(ctx, &body)
}

/// Password change form fields
#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// POST /change-password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<ChangePasswordForm>,
) -> UiResult<Response> {
    let account = &user.account;

    if !verify_account_password(&state.db, account.id, &form.current_password).await? {
        warn!("Password change for '{}' rejected: wrong current password", account.username);
        let flash = Flash::error("Current password is incorrect");
        return Ok(flash_redirect(&state, &user, flash, "/profile").await);
    }

    if form.new_password != form.confirm_password {
        let flash = Flash::error("New password and confirmation do not match");
        return Ok(flash_redirect(&state, &user, flash, "/profile").await);
    }

    if let Err(e) = validate_password(&form.new_password) {
        return Ok(flash_redirect(&state, &user, Flash::error(e.to_string()), "/profile").await);
    }

    set_password(&state.db, account.id, &form.new_password, state.config.password_hash_cost).await?;
    info!("User '{}' changed their password", account.username);

    let flash = Flash::success("Password changed");
    Ok(flash_redirect(&state, &user, flash, "/profile").await)
}
