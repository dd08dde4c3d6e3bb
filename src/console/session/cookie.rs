//! Session cookie rendering and extraction.

use axum::http::{header::COOKIE, header::InvalidHeaderValue, HeaderMap, HeaderValue};

use crate::console::config::ConsoleConfig;

/// A `Set-Cookie` the response must carry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CookieDirective {
    /// Hand the client a (new) session id.
    Issue(String),
    /// Tell the client to drop its session id immediately.
    Expire,
}

/// Build an `HttpOnly`, `SameSite=Strict` cookie header for a directive.
pub(crate) fn render(
    directive: &CookieDirective,
    config: &ConsoleConfig,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let name = config.cookie_name();
    let mut cookie = match directive {
        CookieDirective::Issue(id) => format!(
            "{name}={id}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
            config.idle_timeout_seconds()
        ),
        CookieDirective::Expire => format!(
            "{name}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT"
        ),
    };
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Read the session id from the `Cookie` header(s), if present.
pub(crate) fn extract_session_id(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let key = parts.next()?.trim();
            let val = parts.next()?.trim();
            (key == cookie_name && !val.is_empty()).then(|| val.to_string())
        })
        .next()
}
