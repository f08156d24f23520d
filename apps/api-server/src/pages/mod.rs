//! Server-rendered HTML pages.
//!
//! Markup is assembled with `format!`, no template engine. Pages that
//! show query data run procedures in process through a
//! [`folio_rpc::Caller`] and embed the dehydrated results for the
//! client-side cache to pick up.

pub mod admin;
pub mod auth;
pub mod breadcrumb;
pub mod home;

/// Escape text for interpolation into HTML content or attributes.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

/// Wrap page content in the shared HTML document.
pub fn shell(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{}</title></head><body>{}</body></html>",
        escape_html(title),
        body
    )
}
