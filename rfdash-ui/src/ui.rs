//! Page renderer
//!
//! Every authenticated page is a page-specific HTML fragment wrapped in the
//! shared chrome: sidebar navigation, flash messages and footer. The
//! renderer holds no state; handlers pass everything it needs in a
//! [`PageContext`].

use crate::session::Flash;
use axum::response::Html;
use rfdash_common::db::accounts::Account;
use rfdash_common::Shape;

/// Sidebar entries: (section marker, href, label)
const NAV_ITEMS: &[(&str, &str, &str)] = &[
    ("dashboard", "/", "Dashboard"),
    ("kpi", "/kpi", "KPI"),
    ("rf", "/rf", "RF"),
    ("poi", "/poi", "POI"),
    ("worst-cell", "/worst-cell", "Worst Cell"),
    ("conges-3g", "/conges-3g", "Congestion 3G"),
    ("traffic-down", "/traffic-down", "Traffic Down"),
    ("script", "/script", "Script"),
];

const STYLE: &str = r#"
        body { margin: 0; font-family: system-ui, -apple-system, sans-serif; color: #222; display: flex; min-height: 100vh; }
        nav { width: 220px; background: #1f2d3d; color: #cfd8e3; padding: 16px 0; }
        nav h2 { font-size: 18px; margin: 0 16px 16px; color: #fff; }
        nav a { display: block; padding: 8px 16px; color: #cfd8e3; text-decoration: none; }
        nav a:hover, nav a.active { background: #0066cc; color: #fff; }
        nav .group { margin: 12px 16px 4px; font-size: 12px; text-transform: uppercase; color: #8899aa; }
        main { flex: 1; padding: 24px 32px; }
        h1 { border-bottom: 2px solid #0066cc; padding-bottom: 8px; margin-top: 0; }
        .flash { padding: 10px 14px; border-radius: 4px; margin-bottom: 12px; }
        .flash-success { background: #e3f6e8; border: 1px solid #6cc08b; }
        .flash-info { background: #e6f0fb; border: 1px solid #7aa7e0; }
        .flash-warning { background: #fff6dd; border: 1px solid #e0b44c; }
        .flash-error { background: #fde8e8; border: 1px solid #e07a7a; }
        table { border-collapse: collapse; font-size: 13px; }
        th, td { border: 1px solid #ccd; padding: 4px 8px; text-align: left; white-space: nowrap; }
        th { background: #eef2f7; }
        td.null { color: #aaa; }
        .table-wrap { overflow-x: auto; }
        .cards { display: flex; gap: 16px; flex-wrap: wrap; }
        .card { border: 1px solid #ccd; border-radius: 6px; padding: 16px 24px; min-width: 140px; }
        .card .value { font-size: 28px; font-weight: bold; }
        form.inline { display: inline; }
        label { display: block; margin: 8px 0 4px; }
        footer { margin-top: 32px; font-size: 12px; color: #888; }
"#;

/// Inputs for rendering one page
#[derive(Debug)]
pub struct PageContext<'a> {
    pub title: &'a str,
    /// Section marker highlighted in the sidebar
    pub active: &'a str,
    pub user: &'a Account,
    pub flashes: Vec<Flash>,
}

/// Escape text for interpolation into HTML content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn nav_link(href: &str, label: &str, active: bool) -> String {
    let class = if active { " class=\"active\"" } else { "" };
    format!("<a href=\"{}\"{}>{}</a>\n", href, class, escape_html(label))
}

fn render_sidebar(active: &str, user: &Account) -> String {
    let mut nav = String::from("<nav>\n<h2>RF Dashboard</h2>\n");

    for (marker, href, label) in NAV_ITEMS {
        nav.push_str(&nav_link(href, label, *marker == active));
    }

    nav.push_str("<div class=\"group\">Import</div>\n");
    for shape in Shape::ALL {
        let marker = format!("import-{}", shape.selector());
        let href = format!("/import?type={}", shape.selector());
        nav.push_str(&nav_link(&href, &format!("Import {}", shape.label()), marker == active));
    }

    nav.push_str("<div class=\"group\">Account</div>\n");
    nav.push_str(&nav_link("/profile", "Profile", active == "profile"));
    if user.is_admin() {
        nav.push_str(&nav_link("/users", "Users", active == "users"));
    }
    nav.push_str(&nav_link("/logout", &format!("Logout ({})", user.username), false));

    nav.push_str("</nav>\n");
    nav
}

/// Render flash messages
pub fn render_flashes(flashes: &[Flash]) -> String {
    flashes
        .iter()
        .map(|flash| {
            format!(
                "<div class=\"flash {}\">{}</div>\n",
                flash.level.css_class(),
                escape_html(&flash.message)
            )
        })
        .collect()
}

fn footer() -> String {
    format!(
        "<footer>rfdash-ui v{} [{}] built {} ({})</footer>",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    )
}

/// Wrap a page fragment in the shared chrome
pub fn render_page(ctx: PageContext<'_>, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - RF Dashboard</title>
    <style>{style}</style>
</head>
<body>
{sidebar}<main>
<h1>{title}</h1>
{flashes}{body}
{footer}
</main>
</body>
</html>
"#,
        title = escape_html(ctx.title),
        style = STYLE,
        sidebar = render_sidebar(ctx.active, ctx.user),
        flashes = render_flashes(&ctx.flashes),
        body = body,
        footer = footer(),
    ))
}

/// Standalone page without sidebar (login, failure page)
pub fn render_bare_page(title: &str, flashes: &[Flash], body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - RF Dashboard</title>
    <style>{style}</style>
</head>
<body>
<main>
<h1>{title}</h1>
{flashes}{body}
</main>
</body>
</html>
"#,
        title = escape_html(title),
        style = STYLE,
        flashes = render_flashes(flashes),
        body = body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use rfdash_common::db::accounts::Role;

    fn account(role: Role) -> Account {
        Account {
            id: 1,
            username: "<b>eve</b>".to_string(),
            role,
            protected: false,
            created_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
        assert_eq!(escape_html("Hãng SX"), "Hãng SX");
    }

    #[test]
    fn test_users_link_only_for_admin() {
        let admin = account(Role::Admin);
        let user = account(Role::User);

        fn ctx(user: &Account) -> PageContext<'_> {
            PageContext { title: "T", active: "dashboard", user, flashes: vec![] }
        }
        let Html(admin_page) = render_page(ctx(&admin), "");
        let Html(user_page) = render_page(ctx(&user), "");

        assert!(admin_page.contains("href=\"/users\""));
        assert!(!user_page.contains("href=\"/users\""));
        assert!(user_page.contains("href=\"/import?type=5g\""));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let user = account(Role::User);
        let ctx = PageContext {
            title: "Profile",
            active: "profile",
            user: &user,
            flashes: vec![Flash::error("<script>x</script>")],
        };
        let Html(page) = render_page(ctx, "");

        assert!(!page.contains("<b>eve</b>"));
        assert!(!page.contains("<script>x</script>"));
        assert!(page.contains("flash-error"));
        assert!(page.contains("class=\"active\">Profile</a>"));
    }
}
