//! Report pages
//!
//! The dashboard shows record counts and `/rf` lists stored records; the
//! remaining report pages are placeholders inside the shared layout.

use axum::{
    extract::{Query, State},
    response::Html,
    Extension,
};
use rfdash_common::db::accounts::count_accounts;
use rfdash_common::db::records::{count_records, fetch_page};
use rfdash_common::import::FieldValue;
use rfdash_common::Shape;
use serde::Deserialize;

use super::{page_context, CurrentUser};
use crate::error::UiResult;
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::ui::{escape_html, render_page};
use crate::AppState;

/// GET /
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> UiResult<Html<String>> {
    let mut cards = String::from("<div class=\"cards\">\n");
    for shape in Shape::ALL {
        let count = count_records(&state.db, shape).await?;
        cards.push_str(&format!(
            "<a class=\"card\" href=\"/rf?shape={}\"><div>{} cells</div><div class=\"value\">{}</div></a>\n",
            shape.selector(),
            shape.label(),
            count
        ));
    }

    let accounts = count_accounts(&state.db).await?;
    cards.push_str(&format!(
        "<div class=\"card\"><div>Accounts</div><div class=\"value\">{}</div></div>\n</div>\n",
        accounts
    ));

    let ctx = page_context(&state, &user, "Dashboard", "dashboard").await;
    Ok(render_page(ctx, &cards))
}

async fn placeholder(
    state: &AppState,
    user: &CurrentUser,
    title: &str,
    active: &str,
) -> Html<String> {
    let ctx = page_context(state, user, title, active).await;
    render_page(ctx, "<p>No report data has been published for this page yet.</p>")
}

/// GET /kpi
pub async fn kpi_page(State(state): State<AppState>, Extension(user): Extension<CurrentUser>) -> Html<String> {
    placeholder(&state, &user, "KPI", "kpi").await
}

/// GET /poi
pub async fn poi_page(State(state): State<AppState>, Extension(user): Extension<CurrentUser>) -> Html<String> {
    placeholder(&state, &user, "POI", "poi").await
}

/// GET /worst-cell
pub async fn worst_cell_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Html<String> {
    placeholder(&state, &user, "Worst Cell", "worst-cell").await
}

/// GET /conges-3g
pub async fn conges_3g_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Html<String> {
    placeholder(&state, &user, "Congestion 3G", "conges-3g").await
}

/// GET /traffic-down
pub async fn traffic_down_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Html<String> {
    placeholder(&state, &user, "Traffic Down", "traffic-down").await
}

/// GET /script
pub async fn script_page(State(state): State<AppState>, Extension(user): Extension<CurrentUser>) -> Html<String> {
    placeholder(&state, &user, "Script", "script").await
}

/// Query parameters for the RF listing
#[derive(Debug, Deserialize)]
pub struct RfQuery {
    pub shape: Option<String>,
    /// Kept as text so a malformed value falls back to page 1
    pub page: Option<String>,
}

fn render_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => "<td class=\"null\"></td>".to_string(),
        FieldValue::Text(s) => format!("<td>{}</td>", escape_html(s)),
        FieldValue::Integer(i) => format!("<td>{}</td>", i),
        FieldValue::Real(r) => format!("<td>{}</td>", r),
    }
}

fn shape_tabs(current: Shape) -> String {
    Shape::ALL
        .iter()
        .map(|shape| {
            if *shape == current {
                format!("<strong>{}</strong>", shape.label())
            } else {
                format!("<a href=\"/rf?shape={}\">{}</a>", shape.selector(), shape.label())
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// GET /rf?shape=&page=
///
/// Unknown shapes fall back to 4G; the page number is clamped and a
/// non-numeric page means page 1.
pub async fn rf_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<RfQuery>,
) -> UiResult<Html<String>> {
    let shape = query
        .shape
        .as_deref()
        .and_then(Shape::from_selector)
        .unwrap_or(Shape::Rf4g);

    let total = count_records(&state.db, shape).await?;
    let requested_page = query
        .page
        .as_deref()
        .and_then(|p| p.trim().parse::<i64>().ok())
        .unwrap_or(1);
    let pagination = calculate_pagination(total, requested_page);
    let records = fetch_page(&state.db, shape, PAGE_SIZE, pagination.offset).await?;

    let mut body = format!(
        "<p>{}</p>\n<p>{} {} records</p>\n",
        shape_tabs(shape),
        total,
        shape.label()
    );

    if records.rows.is_empty() {
        body.push_str(&format!(
            "<p>No records yet. <a href=\"/import?type={}\">Import a file</a>.</p>\n",
            shape.selector()
        ));
    } else {
        body.push_str("<div class=\"table-wrap\"><table>\n<tr>");
        for column in &records.columns {
            body.push_str(&format!("<th>{}</th>", column));
        }
        body.push_str("</tr>\n");
        for row in &records.rows {
            body.push_str("<tr>");
            for value in row {
                body.push_str(&render_value(value));
            }
            body.push_str("</tr>\n");
        }
        body.push_str("</table></div>\n");
    }

    if pagination.total_pages > 1 {
        body.push_str("<p>");
        if pagination.page > 1 {
            body.push_str(&format!(
                "<a href=\"/rf?shape={}&amp;page={}\">&laquo; Previous</a> ",
                shape.selector(),
                pagination.page - 1
            ));
        }
        body.push_str(&format!("Page {} of {}", pagination.page, pagination.total_pages));
        if pagination.page < pagination.total_pages {
            body.push_str(&format!(
                " <a href=\"/rf?shape={}&amp;page={}\">Next &raquo;</a>",
                shape.selector(),
                pagination.page + 1
            ));
        }
        body.push_str("</p>\n");
    }

    let ctx = page_context(&state, &user, "RF", "rf").await;
    Ok(render_page(ctx, &body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_value_escapes_text() {
        assert_eq!(render_value(&FieldValue::Text("<x>".into())), "<td>&lt;x&gt;</td>");
        assert_eq!(render_value(&FieldValue::Null), "<td class=\"null\"></td>");
        assert_eq!(render_value(&FieldValue::Real(21.5)), "<td>21.5</td>");
    }

    #[test]
    fn test_shape_tabs_mark_current() {
        let tabs = shape_tabs(Shape::Rf3g);
        assert!(tabs.contains("<strong>3G</strong>"));
        assert!(tabs.contains("href=\"/rf?shape=5g\""));
    }
}
