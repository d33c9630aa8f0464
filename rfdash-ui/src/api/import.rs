//! Import handlers
//!
//! GET renders the upload form for `?type=3g|4g|5g`; POST reads the
//! multipart `file` field and runs the import pipeline. Every outcome is
//! flashed and the form is rendered again.

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Extension,
};
use rfdash_common::import::{import_upload, ImportError, ImportReport, Upload};
use rfdash_common::Shape;
use serde::Deserialize;
use tracing::{error, warn};

use super::{page_context, CurrentUser};
use crate::session::Flash;
use crate::ui::{escape_html, render_page};
use crate::AppState;

/// `?type=` selector
#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    #[serde(rename = "type")]
    pub shape: Option<String>,
}

impl ImportQuery {
    fn selector(&self) -> &str {
        self.shape.as_deref().unwrap_or("")
    }
}

fn import_body(selector: &str) -> String {
    let shape = Shape::from_selector(selector);

    let options: String = Shape::ALL
        .iter()
        .map(|s| {
            let selected = if Some(*s) == shape { " selected" } else { "" };
            format!("<option value=\"{}\"{}>{}</option>", s.selector(), selected, s.label())
        })
        .collect();

    let fields = match shape {
        Some(shape) => shape
            .fields()
            .iter()
            .map(|f| f.name)
            .collect::<Vec<_>>()
            .join(", "),
        None => "choose a data type".to_string(),
    };

    format!(
        r#"<form method="get" action="/import">
    <label for="type">Data type</label>
    <select id="type" name="type" onchange="this.form.submit()">{options}</select>
</form>
<form method="post" action="/import?type={selector}" enctype="multipart/form-data">
    <label for="file">Spreadsheet (.csv, .xls, .xlsx)</label>
    <input id="file" name="file" type="file" accept=".csv,.xls,.xlsx">
    <p><button type="submit">Import</button></p>
</form>
<p><small>Recognized columns: {fields}</small></p>"#,
        options = options,
        selector = escape_html(selector),
        fields = fields,
    )
}

fn title_for(selector: &str) -> String {
    match Shape::from_selector(selector) {
        Some(shape) => format!("Import {}", shape.label()),
        None => "Import".to_string(),
    }
}

fn active_for(selector: &str) -> String {
    match Shape::from_selector(selector) {
        Some(shape) => format!("import-{}", shape.selector()),
        None => "import".to_string(),
    }
}

async fn render_form(state: &AppState, user: &CurrentUser, selector: &str) -> Html<String> {
    let title = title_for(selector);
    let active = active_for(selector);
    let ctx = page_context(state, user, &title, &active).await;
    render_page(ctx, &import_body(selector))
}

/// GET /import
pub async fn import_form(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ImportQuery>,
) -> Html<String> {
    render_form(&state, &user, query.selector()).await
}

fn success_flash(report: &ImportReport) -> Flash {
    let mut message = format!(
        "Imported {} {} records from {}",
        report.imported,
        report.shape.label(),
        report.filename
    );
    if !report.dropped_columns.is_empty() {
        message.push_str(&format!(
            ". Ignored columns: {}",
            report.dropped_columns.join(", ")
        ));
    }
    Flash::success(message)
}

fn failure_flash(err: &ImportError) -> Flash {
    match err {
        ImportError::NoFile => Flash::warning(err.to_string()),
        ImportError::Storage(_) => {
            error!("Import storage failure: {}", err);
            Flash::error(format!("{}. No records were saved.", err))
        }
        _ => Flash::error(err.to_string()),
    }
}

/// POST /import
pub async fn import_submit(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ImportQuery>,
    mut multipart: Multipart,
) -> Response {
    let selector = query.selector().to_string();
    let mut filename: Option<String> = None;
    let mut bytes = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Rejected upload from '{}': {}", user.account.username, e);
                let status = e.status();
                state
                    .sessions
                    .push_flash(&user.token, Flash::error(format!("Upload failed: {}", e.body_text())))
                    .await;
                return (status, render_form(&state, &user, &selector).await).into_response();
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        filename = field.file_name().map(str::to_string);
        match field.bytes().await {
            Ok(data) => bytes = data.to_vec(),
            Err(e) => {
                warn!("Rejected upload from '{}': {}", user.account.username, e);
                let status = e.status();
                state
                    .sessions
                    .push_flash(&user.token, Flash::error(format!("Upload failed: {}", e.body_text())))
                    .await;
                return (status, render_form(&state, &user, &selector).await).into_response();
            }
        }
        break;
    }

    let upload = Upload {
        selector: &selector,
        filename: filename.as_deref(),
        bytes: &bytes,
    };

    let flash = match import_upload(&state.db, upload).await {
        Ok(report) => success_flash(&report),
        Err(err) => failure_flash(&err),
    };
    state.sessions.push_flash(&user.token, flash).await;

    (StatusCode::OK, render_form(&state, &user, &selector).await).into_response()
}
