//! In-process session store
//!
//! A session maps an opaque random token to the logged-in account id plus
//! a queue of pending flash messages. The browser holds
//! `token.signature` in the `rfdash_session` cookie; cookies whose
//! signature does not match the configured secret key are ignored.
//!
//! Sessions live for the process lifetime (no expiry policy).

use axum::http::{header, HeaderMap};
use rfdash_common::auth::{generate_session_token, signed_cookie_value, verify_cookie_value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Session cookie name
pub const SESSION_COOKIE: &str = "rfdash_session";

/// Flash message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl FlashLevel {
    /// CSS class used by the layout
    pub fn css_class(self) -> &'static str {
        match self {
            FlashLevel::Success => "flash-success",
            FlashLevel::Info => "flash-info",
            FlashLevel::Warning => "flash-warning",
            FlashLevel::Error => "flash-error",
        }
    }
}

/// One transient user-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: FlashLevel::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: FlashLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: FlashLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: FlashLevel::Error, message: message.into() }
    }
}

#[derive(Debug, Clone)]
struct Session {
    account_id: i64,
    flashes: Vec<Flash>,
}

/// Shared session table
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for an account and return its fresh token
    pub async fn create(&self, account_id: i64) -> String {
        let token = generate_session_token();
        self.sessions.write().await.insert(
            token.clone(),
            Session { account_id, flashes: Vec::new() },
        );
        token
    }

    /// Account id bound to a token
    pub async fn account_id(&self, token: &str) -> Option<i64> {
        self.sessions.read().await.get(token).map(|s| s.account_id)
    }

    /// End a session
    pub async fn remove(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }

    /// Drop every session of an account (after the account is deleted)
    pub async fn remove_account(&self, account_id: i64) {
        self.sessions
            .write()
            .await
            .retain(|_, session| session.account_id != account_id);
    }

    /// Queue a flash message; ignored for unknown tokens
    pub async fn push_flash(&self, token: &str, flash: Flash) {
        if let Some(session) = self.sessions.write().await.get_mut(token) {
            session.flashes.push(flash);
        }
    }

    /// Drain pending flash messages
    pub async fn take_flashes(&self, token: &str) -> Vec<Flash> {
        self.sessions
            .write()
            .await
            .get_mut(token)
            .map(|session| std::mem::take(&mut session.flashes))
            .unwrap_or_default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Extract and verify the session token from request headers
pub fn token_from_headers(headers: &HeaderMap, secret_key: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| *name == SESSION_COOKIE)
        .find_map(|(_, value)| verify_cookie_value(value, secret_key))
        .map(str::to_string)
}

/// `Set-Cookie` value establishing a session
pub fn session_cookie(token: &str, secret_key: &str) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/",
        SESSION_COOKIE,
        signed_cookie_value(token, secret_key)
    )
}

/// `Set-Cookie` value clearing the session cookie
pub fn expired_session_cookie() -> String {
    format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    )
}
