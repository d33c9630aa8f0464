//! Account administration (admin only)

use axum::{
    extract::{Path, State},
    response::{Html, Response},
    Extension, Form,
};
use rfdash_common::db::accounts::{
    create_account, delete_account, list_accounts, set_password, DeleteOutcome, Role,
};
use rfdash_common::Error;
use serde::Deserialize;
use tracing::info;

use super::{flash_redirect, page_context, CurrentUser};
use crate::error::UiResult;
use crate::session::Flash;
use crate::ui::{escape_html, render_page};
use crate::AppState;

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> UiResult<Html<String>> {
    let accounts = list_accounts(&state.db).await?;

    let mut body = String::from(
        "<table>\n<tr><th>ID</th><th>Username</th><th>Role</th><th>Created</th><th>Actions</th></tr>\n",
    );
    for account in &accounts {
        let actions = if account.protected {
            "<em>protected</em>".to_string()
        } else if account.id == user.account.id {
            "<em>you</em>".to_string()
        } else {
            format!(
                r#"<form class="inline" method="post" action="/users/reset-pass/{id}">
    <input name="new_pass" type="password" placeholder="New password" required>
    <button type="submit">Reset password</button>
</form>
<form class="inline" method="post" action="/users/delete/{id}">
    <button type="submit">Delete</button>
</form>"#,
                id = account.id
            )
        };

        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            account.id,
            escape_html(&account.username),
            account.role.as_str(),
            account.created_at.format("%Y-%m-%d %H:%M"),
            actions
        ));
    }
    body.push_str("</table>\n");

    body.push_str(
        r#"<h2>Add user</h2>
<form method="post" action="/users/add">
    <label for="username">Username</label>
    <input id="username" name="username" required>
    <label for="password">Password</label>
    <input id="password" name="password" type="password" required>
    <label for="role">Role</label>
    <select id="role" name="role">
        <option value="user" selected>user</option>
        <option value="admin">admin</option>
    </select>
    <p><button type="submit">Add user</button></p>
</form>"#,
    );

    let ctx = page_context(&state, &user, "Users", "users").await;
    Ok(render_page(ctx, &body))
}

/// New account form fields
#[derive(Debug, Deserialize)]
pub struct AddUserForm {
    pub username: String,
    pub password: String,
    pub role: String,
}

/// POST /users/add
pub async fn add_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<AddUserForm>,
) -> UiResult<Response> {
    let Some(role) = Role::parse(&form.role) else {
        let flash = Flash::error(format!("Unknown role '{}'", form.role));
        return Ok(flash_redirect(&state, &user, flash, "/users").await);
    };

    let flash = match create_account(
        &state.db,
        &form.username,
        &form.password,
        role,
        state.config.password_hash_cost,
    )
    .await
    {
        Ok(account) => {
            info!("Admin '{}' created account '{}'", user.account.username, account.username);
            Flash::success(format!("User '{}' created", account.username))
        }
        Err(Error::InvalidInput(message)) => Flash::error(message),
        Err(e) => return Err(e.into()),
    };

    Ok(flash_redirect(&state, &user, flash, "/users").await)
}

/// Parse an account id from the path; a malformed id is reported like an unknown one
fn parse_account_id(raw: &str) -> Result<i64, Flash> {
    raw.trim()
        .parse()
        .map_err(|_| Flash::error(format!("User {} not found", raw)))
}

/// GET|POST /users/delete/{id}
///
/// Protected accounts and the caller's own account are never deleted.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
) -> UiResult<Response> {
    let id = match parse_account_id(&raw_id) {
        Ok(id) => id,
        Err(flash) => return Ok(flash_redirect(&state, &user, flash, "/users").await),
    };

    let flash = match delete_account(&state.db, id, user.account.id).await? {
        DeleteOutcome::Deleted(username) => {
            state.sessions.remove_account(id).await;
            info!("Admin '{}' deleted account '{}'", user.account.username, username);
            Flash::success(format!("User '{}' deleted", username))
        }
        DeleteOutcome::Protected(username) => {
            Flash::warning(format!("User '{}' is protected and cannot be deleted", username))
        }
        DeleteOutcome::SelfDelete => Flash::warning("You cannot delete your own account"),
        DeleteOutcome::NotFound => Flash::error(format!("User {} not found", id)),
    };

    Ok(flash_redirect(&state, &user, flash, "/users").await)
}

/// Password reset form fields
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub new_pass: String,
}

/// POST /users/reset-pass/{id}
pub async fn reset_password(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> UiResult<Response> {
    let id = match parse_account_id(&raw_id) {
        Ok(id) => id,
        Err(flash) => return Ok(flash_redirect(&state, &user, flash, "/users").await),
    };

    let flash = match set_password(&state.db, id, &form.new_pass, state.config.password_hash_cost).await {
        Ok(()) => {
            info!("Admin '{}' reset the password of account {}", user.account.username, id);
            Flash::success(format!("Password reset for user {}", id))
        }
        Err(Error::InvalidInput(message)) => Flash::error(message),
        Err(Error::NotFound(_)) => Flash::error(format!("User {} not found", id)),
        Err(e) => return Err(e.into()),
    };

    Ok(flash_redirect(&state, &user, flash, "/users").await)
}
