//! Minimal inline HTML views
//!
//! The public pages are deliberately plain strings; presentation-heavy
//! rendering lives outside this service.

use crate::db::ambassadors::Ambassador;
use crate::referral::commission::Estimate;

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Epoch-ms timestamp rendered as RFC 3339 (UTC).
pub fn fmt_ts(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .unwrap_or_default()
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\">\
         <title>{}</title></head><body>{}</body></html>",
        escape_html(title),
        body
    )
}

/// Registration form, optionally re-rendered with an error and the submitted
/// values filled back in.
pub fn register_form(error: Option<&str>, values: &RegisterFormValues) -> String {
    let error_html = error
        .map(|e| format!("<p class=\"error\">{}</p>", escape_html(e)))
        .unwrap_or_default();
    let body = format!(
        "<h1>Become an ambassador</h1>\
         {error_html}\
         <form method=\"post\" action=\"/register\">\
           <label>Name<br><input name=\"name\" value=\"{name}\"></label><br>\
           <label>Email<br><input name=\"email\" type=\"email\" value=\"{email}\"></label><br>\
           <label>Payout preference<br><input name=\"payout_preference\" value=\"{preference}\"></label><br>\
           <label>Payout identifier<br><input name=\"payout_identifier\" value=\"{identifier}\"></label><br>\
           <label><input type=\"checkbox\" name=\"accept_terms\"> I accept the terms</label><br>\
           <button type=\"submit\">Register</button>\
         </form>",
        name = escape_html(&values.name),
        email = escape_html(&values.email),
        preference = escape_html(&values.payout_preference),
        identifier = escape_html(&values.payout_identifier),
    );
    page("Ambassador registration", &body)
}

/// Submitted form values echoed back on a validation failure.
#[derive(Debug, Default)]
pub struct RegisterFormValues {
    pub name: String,
    pub email: String,
    pub payout_preference: String,
    pub payout_identifier: String,
}

pub fn dashboard(ambassador: &Ambassador, estimate: &Estimate, short_link: &str) -> String {
    let body = format!(
        "<h1>Ambassador dashboard</h1>\
         <p>Welcome back, {name}.</p>\
         <p>Your code: <code>{code}</code><br>\
         Link to share: <a href=\"{link}\">{link}</a></p>\
         <table>\
           <tr><th>Clicks</th><td>{clicks}</td></tr>\
           <tr><th>Signups</th><td>{signups}</td></tr>\
           <tr><th>Estimated upfront</th><td>{upfront}</td></tr>\
           <tr><th>Estimated monthly recurring</th><td>{monthly}</td></tr>\
           <tr><th>Estimated 6-month total</th><td>{six_month}</td></tr>\
         </table>\
         <p><small>Commission figures are estimates for orientation only, \
         not a statement of amounts owed.</small></p>\
         <p><small>Member since {since}</small></p>",
        name = escape_html(&ambassador.name),
        code = escape_html(&ambassador.code),
        link = escape_html(short_link),
        clicks = ambassador.clicks,
        signups = ambassador.signups,
        upfront = estimate.upfront,
        monthly = estimate.monthly_recurring,
        six_month = estimate.six_month_total,
        since = fmt_ts(ambassador.created_at),
    );
    page("Ambassador dashboard", &body)
}

pub fn dashboard_not_found() -> String {
    page(
        "Ambassador not found",
        "<h1>Ambassador not found</h1>\
         <p>No ambassador matches that code or email. Check your link, \
         or <a href=\"/register\">register</a>.</p>",
    )
}

pub fn admin_table(rows: &[Ambassador]) -> String {
    let mut table = String::from(
        "<h1>Ambassadors</h1><table border=\"1\">\
         <tr><th>Name</th><th>Email</th><th>Code</th>\
         <th>Clicks</th><th>Signups</th><th>Created</th><th>Updated</th></tr>",
    );
    for a in rows {
        table.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td>\
             <td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&a.name),
            escape_html(&a.email),
            escape_html(&a.code),
            a.clicks,
            a.signups,
            fmt_ts(a.created_at),
            fmt_ts(a.updated_at),
        ));
    }
    table.push_str("</table>");
    page("Ambassadors", &table)
}
