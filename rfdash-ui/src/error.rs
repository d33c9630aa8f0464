//! Error types for rfdash-ui
//!
//! User input problems never reach this type: handlers flash them and
//! render the page normally. `UiError` covers storage faults and other
//! failures, which render a generic failure page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::ui::render_bare_page;

/// Handler error
#[derive(Debug, Error)]
pub enum UiError {
    /// rfdash-common error (database, I/O, ...)
    #[error("Common error: {0}")]
    Common(#[from] rfdash_common::Error),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for UiError {
    fn into_response(self) -> Response {
        // Details go to the log only
        error!("Request failed: {}", self);

        let page = render_bare_page(
            "Something went wrong",
            &[],
            "<p>The request could not be completed. No changes were saved.</p>\n<p><a href=\"/\">Back to the dashboard</a></p>",
        );

        (StatusCode::INTERNAL_SERVER_ERROR, page).into_response()
    }
}

/// Result type for page handlers
pub type UiResult<T> = Result<T, UiError>;
