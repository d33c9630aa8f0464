//! Account storage
//!
//! Accounts are created by an admin or by first-run bootstrap, mutated only
//! by password changes, and deleted by an admin (never the protected
//! bootstrap account).

use crate::auth::{hash_password, validate_password, verify_password};
use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

/// Username given to the bootstrap admin
pub const BOOTSTRAP_USERNAME: &str = "admin";

/// Longest accepted username
pub const MAX_USERNAME_LEN: usize = 64;

/// Role tag stored with each account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

/// Account without its password hash
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub protected: bool,
    pub created_at: NaiveDateTime,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Result of an admin delete request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(String),
    Protected(String),
    SelfDelete,
    NotFound,
}

fn account_from_row(row: &SqliteRow) -> Result<Account> {
    let role: String = row.try_get("role")?;
    let role = Role::parse(&role)
        .ok_or_else(|| Error::Internal(format!("Unknown role tag in database: {}", role)))?;

    Ok(Account {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        role,
        protected: row.try_get::<i64, _>("protected")? != 0,
        created_at: row.try_get("created_at")?,
    })
}

const ACCOUNT_COLUMNS: &str = "id, username, role, protected, created_at";

/// Hash a password on the blocking pool
async fn hash_off_thread(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| Error::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| Error::Internal(e.to_string()))
}

/// Verify a password on the blocking pool
async fn verify_off_thread(password: &str, stored_hash: String) -> Result<bool> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| Error::Internal(format!("Password verification task failed: {}", e)))
}

/// Count all accounts
pub async fn count_accounts(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Load one account by id
pub async fn get_account(pool: &SqlitePool, id: i64) -> Result<Option<Account>> {
    let row = sqlx::query(&format!("SELECT {} FROM accounts WHERE id = ?", ACCOUNT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(account_from_row).transpose()
}

/// List all accounts ordered by id
pub async fn list_accounts(pool: &SqlitePool) -> Result<Vec<Account>> {
    let rows = sqlx::query(&format!("SELECT {} FROM accounts ORDER BY id ASC", ACCOUNT_COLUMNS))
        .fetch_all(pool)
        .await?;

    rows.iter().map(account_from_row).collect()
}

/// Check credentials
///
/// Returns the account when the username exists and the password verifies.
pub async fn authenticate(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Option<Account>> {
    let row = sqlx::query(&format!(
        "SELECT {}, password_hash FROM accounts WHERE username = ?",
        ACCOUNT_COLUMNS
    ))
    .bind(username.trim())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let stored_hash: String = row.try_get("password_hash")?;
    if !verify_off_thread(password, stored_hash).await? {
        return Ok(None);
    }

    account_from_row(&row).map(Some)
}

/// Verify the current password of an account
pub async fn verify_account_password(pool: &SqlitePool, id: i64, password: &str) -> Result<bool> {
    let stored_hash: Option<String> =
        sqlx::query_scalar("SELECT password_hash FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    match stored_hash {
        Some(hash) => verify_off_thread(password, hash).await,
        None => Ok(false),
    }
}

fn validate_username(username: &str) -> Result<&str> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::InvalidInput("Username must not be empty".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(Error::InvalidInput(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LEN
        )));
    }
    Ok(username)
}

/// Create an account
///
/// Fails with `InvalidInput` for an empty/overlong username, a short
/// password, or a username that already exists.
pub async fn create_account(
    pool: &SqlitePool,
    username: &str,
    password: &str,
    role: Role,
    hash_cost: u32,
) -> Result<Account> {
    let username = validate_username(username)?;
    validate_password(password).map_err(|e| Error::InvalidInput(e.to_string()))?;
    let password_hash = hash_off_thread(password, hash_cost).await?;

    let result = sqlx::query(
        "INSERT INTO accounts (username, password_hash, role) VALUES (?, ?, ?)",
    )
    .bind(username)
    .bind(&password_hash)
    .bind(role.as_str())
    .execute(pool)
    .await;

    let id = match result {
        Ok(done) => done.last_insert_rowid(),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err(Error::InvalidInput(format!(
                "Username '{}' already exists",
                username
            )));
        }
        Err(e) => return Err(e.into()),
    };

    info!("Created account '{}' ({})", username, role.as_str());

    get_account(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Account {} vanished after insert", id)))
}

/// Replace an account's password
pub async fn set_password(pool: &SqlitePool, id: i64, new_password: &str, hash_cost: u32) -> Result<()> {
    validate_password(new_password).map_err(|e| Error::InvalidInput(e.to_string()))?;
    let password_hash = hash_off_thread(new_password, hash_cost).await?;

    let result = sqlx::query("UPDATE accounts SET password_hash = ? WHERE id = ?")
        .bind(&password_hash)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Account {}", id)));
    }

    Ok(())
}

/// Delete an account on behalf of `acting_id`
///
/// Protected accounts and the acting account itself are left untouched.
pub async fn delete_account(pool: &SqlitePool, id: i64, acting_id: i64) -> Result<DeleteOutcome> {
    if id == acting_id {
        return Ok(DeleteOutcome::SelfDelete);
    }

    let mut tx = pool.begin().await?;

    let row: Option<(String, i64)> =
        sqlx::query_as("SELECT username, protected FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

    let outcome = match row {
        None => DeleteOutcome::NotFound,
        Some((username, protected)) if protected != 0 => {
            warn!("Refused to delete protected account '{}'", username);
            DeleteOutcome::Protected(username)
        }
        Some((username, _)) => {
            sqlx::query("DELETE FROM accounts WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            info!("Deleted account '{}'", username);
            DeleteOutcome::Deleted(username)
        }
    };

    tx.commit().await?;
    Ok(outcome)
}

/// Seed the protected bootstrap admin when no account exists
///
/// Returns true when the account was created.
pub async fn ensure_bootstrap_admin(pool: &SqlitePool, password: &str, hash_cost: u32) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
        .fetch_one(&mut *tx)
        .await?;
    if existing > 0 {
        return Ok(false);
    }

    let password_hash = hash_off_thread(password, hash_cost).await?;

    sqlx::query(
        "INSERT INTO accounts (username, password_hash, role, protected) VALUES (?, ?, 'admin', 1)",
    )
    .bind(BOOTSTRAP_USERNAME)
    .bind(&password_hash)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!("Seeded bootstrap account '{}'", BOOTSTRAP_USERNAME);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse(" User "), Some(Role::User));
        assert_eq!(Role::parse("root"), None);
        assert_eq!(Role::parse(Role::Admin.as_str()), Some(Role::Admin));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_hashing_leaves_runtime_free() {
        // On a single-threaded runtime the ticker only runs while the
        // hash is computed elsewhere
        let ticker = tokio::spawn(async { std::time::Instant::now() });

        let hash = hash_off_thread("hunter22", 8).await.unwrap();
        let hashed_at = std::time::Instant::now();

        assert!(ticker.await.unwrap() < hashed_at);
        assert!(verify_off_thread("hunter22", hash.clone()).await.unwrap());
        assert!(!verify_off_thread("wrong", hash).await.unwrap());
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("   ").is_err());
        assert_eq!(validate_username("  alice ").unwrap(), "alice");
        assert!(validate_username(&"x".repeat(MAX_USERNAME_LEN + 1)).is_err());
    }
}
