//! Page shell: head, sidebar, user badge.
//!
//! The theme bootstrap script is always the first element of `<head>`, ahead
//! of the stylesheet, so the stored theme class is on `<html>` before any
//! themed rule applies.

use std::fmt::Write;

use axum::http::StatusCode;

use super::theme::{Theme, BOOTSTRAP_SCRIPT, PICKER_SCRIPT};
use super::{escape, NAV_ITEMS};
use crate::context::RequestContext;
use crate::rbac::{Permission, RbacGate};
use crate::session::Session;

const STYLES: &str = r#"
:root{--bg:#f7f8fa;--fg:#1c2330;--muted:#5b6678;--card:#fff;--line:#dfe3ea;--accent:#2f6fed;--ok:#1f8a4c;--warn:#b7791f;--err:#c53030}
html.dark{--bg:#12161d;--fg:#e6e9ef;--muted:#9aa4b5;--card:#1b212b;--line:#2b3340;--accent:#6c9bff;--ok:#48bb78;--warn:#ecc94b;--err:#fc8181}
*{box-sizing:border-box}
body{margin:0;font:15px/1.5 system-ui,sans-serif;background:var(--bg);color:var(--fg)}
.shell{display:flex;min-height:100vh}
.sidebar{width:230px;padding:20px;border-right:1px solid var(--line);background:var(--card)}
.sidebar nav a{display:block;padding:6px 10px;border-radius:6px;color:var(--fg);text-decoration:none}
.sidebar nav a.active{background:var(--accent);color:#fff}
.brand{font-weight:700;font-size:18px;margin-bottom:18px}
.badge{margin-top:24px;padding-top:12px;border-top:1px solid var(--line);color:var(--muted);font-size:13px}
main{flex:1;padding:28px 36px;max-width:1100px}
.centered{max-width:520px;margin:12vh auto;padding:28px;background:var(--card);border:1px solid var(--line);border-radius:10px}
table{width:100%;border-collapse:collapse;background:var(--card)}
th,td{text-align:left;padding:8px 10px;border-bottom:1px solid var(--line)}
.cards{display:grid;grid-template-columns:repeat(auto-fit,minmax(180px,1fr));gap:16px;margin-bottom:24px}
.card{background:var(--card);border:1px solid var(--line);border-radius:10px;padding:16px}
.card .value{font-size:28px;font-weight:700}
form.inline{display:inline}
form.panel{background:var(--card);border:1px solid var(--line);border-radius:10px;padding:16px;margin:16px 0}
form.panel label{display:block;margin:6px 0}
input,select,textarea{font:inherit;padding:5px 8px;border:1px solid var(--line);border-radius:6px;background:var(--bg);color:var(--fg)}
a.button{display:inline-block;padding:6px 14px;border-radius:6px;background:var(--accent);color:#fff;text-decoration:none}
button{font:inherit;padding:6px 14px;border:0;border-radius:6px;background:var(--accent);color:#fff;cursor:pointer}
.alert{padding:10px 14px;border-radius:8px;margin:12px 0;border:1px solid}
.alert-success{border-color:var(--ok);color:var(--ok)}
.alert-warning{border-color:var(--warn);color:var(--warn)}
.alert-error{border-color:var(--err);color:var(--err)}
.chart rect{fill:var(--accent)}
.chart text{fill:var(--fg);font-size:12px}
"#;

/// What a dashboard page needs to draw its shell.
pub struct PageView<'a> {
    pub ctx: &'a RequestContext,
    pub gate: &'a RbacGate,
    /// Request path, used for the active nav entry and sign-in callbacks.
    pub path: &'a str,
    pub title: &'a str,
}

impl<'a> PageView<'a> {
    pub fn new(ctx: &'a RequestContext, gate: &'a RbacGate, path: &'a str, title: &'a str) -> Self {
        Self {
            ctx,
            gate,
            path,
            title,
        }
    }

    /// Full document with sidebar around `content`.
    pub fn render(&self, content: &str) -> String {
        let mut body = String::from(r#"<div class="shell"><aside class="sidebar">"#);
        body.push_str(r#"<div class="brand">EdForge</div><nav>"#);
        for item in NAV_ITEMS {
            if !self.gate.has_permission(self.ctx.session(), &item.permission) {
                continue;
            }
            let active = if is_active(self.path, item.href) { r#" class="active""# } else { "" };
            let _ = write!(body, r#"<a href="{}"{}>{}</a>"#, item.href, active, escape(item.label));
        }
        body.push_str("</nav>");
        body.push_str(&theme_picker());
        if let Some(session) = self.ctx.session() {
            body.push_str(&user_badge(session));
        }
        let _ = write!(body, "</aside><main>{}</main></div>", content);

        document(self.title, &body, true)
    }
}

fn is_active(path: &str, href: &str) -> bool {
    if href == "/dashboard" {
        return path == href;
    }
    path.strip_prefix(href)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn theme_picker() -> String {
    let mut html =
        String::from(r#"<label class="badge">Theme <select id="theme-select" aria-label="Theme">"#);
    for theme in Theme::ALL {
        let _ = write!(html, r#"<option value="{0}">{0}</option>"#, theme.as_str());
    }
    html.push_str("</select></label>");
    html
}

/// Name, role and tenant. Never the access token.
fn user_badge(session: &Session) -> String {
    format!(
        r#"<div class="badge"><div><strong>{}</strong></div><div>{}</div><div>Tenant {}</div><form method="post" action="/auth/signout"><button type="submit">Sign out</button></form></div>"#,
        escape(session.display_name()),
        escape(session.role.as_str()),
        escape(session.tenant_id.as_str()),
    )
}

/// A complete HTML document. The theme script comes first in `<head>`.
pub fn document(title: &str, body: &str, with_picker: bool) -> String {
    let picker = if with_picker {
        format!("<script>{}</script>", PICKER_SCRIPT)
    } else {
        String::new()
    };
    format!(
        r#"<!DOCTYPE html><html lang="en"><head><script>{script}</script><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1"><title>{title} | EdForge</title><style>{styles}</style></head><body>{body}{picker}</body></html>"#,
        script = BOOTSTRAP_SCRIPT,
        title = escape(title),
        styles = STYLES,
        body = body,
        picker = picker,
    )
}

/// Page for an error that ends the request. Shows only the friendly message.
pub fn error_page(status: StatusCode, message: &str) -> String {
    let heading = status.canonical_reason().unwrap_or("Error");
    let body = format!(
        r#"<div class="centered"><h1>{}</h1><p>{}</p><p><a href="/dashboard">Back to dashboard</a></p></div>"#,
        escape(heading),
        escape(message),
    );
    document(heading, &body, false)
}

/// The page guard's 403 page.
pub fn deny_page(ctx: &RequestContext, permission: &Permission) -> String {
    no_permission_page(
        ctx,
        &format!("Your role does not include the {} permission.", permission),
    )
}

/// Explicit "no permission" page.
pub fn no_permission_page(ctx: &RequestContext, detail: &str) -> String {
    let who = ctx
        .session()
        .map(|s| format!("<p>Signed in as {}.</p>", escape(s.display_name())))
        .unwrap_or_default();
    let body = format!(
        r#"<div class="centered"><h1>No permission</h1><p>You do not have permission to view this page.</p><p>{}</p>{}<p><a href="/dashboard">Back to dashboard</a></p></div>"#,
        escape(detail),
        who,
    );
    document("No permission", &body, false)
}
