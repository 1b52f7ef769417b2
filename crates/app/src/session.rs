//! Admin session cookie and the dashboard gate
//!
//! The cookie carries no secret: its presence is the whole session. Pages
//! under `/dashboard` need it and `/login` bounces visitors who have it.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use hadir_config::AuthConfig;
use tracing::debug;

use crate::state::AppState;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const DASHBOARD_HOME: &str = "/dashboard/daftar-hadir";

const SESSION_VALUE: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(&'static str),
}

pub fn gate(path: &str, has_session: bool) -> GateDecision {
    if path.starts_with(DASHBOARD_PATH) && !has_session {
        GateDecision::Redirect(LOGIN_PATH)
    } else if path.starts_with(LOGIN_PATH) && has_session {
        GateDecision::Redirect(DASHBOARD_HOME)
    } else {
        GateDecision::Allow
    }
}

/// Value of cookie `name` in a `Cookie` header
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

/// Whether the request carries the session cookie, whatever its value
pub fn has_session(headers: &HeaderMap, cookie_name: &str) -> bool {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|header| cookie_value(header, cookie_name).is_some())
}

fn attributes(max_age: i64, production: bool) -> String {
    let mut attrs = format!("HttpOnly; Path=/; Max-Age={max_age}; SameSite=Lax");
    if production {
        attrs.push_str("; Secure");
    }
    attrs
}

/// `Set-Cookie` value starting a session
pub fn session_cookie(auth: &AuthConfig, production: bool) -> String {
    format!(
        "{}={}; {}",
        auth.cookie_name,
        SESSION_VALUE,
        attributes(auth.max_age_secs, production)
    )
}

/// `Set-Cookie` value ending a session
pub fn clear_cookie(auth: &AuthConfig, production: bool) -> String {
    format!("{}=; {}", auth.cookie_name, attributes(0, production))
}

/// Middleware applying [`gate`] to every request
pub async fn gate_layer(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let signed_in = has_session(request.headers(), &state.config.auth.cookie_name);
    match gate(&path, signed_in) {
        GateDecision::Allow => next.run(request).await,
        GateDecision::Redirect(to) => {
            debug!("Gate redirect {} -> {}", path, to);
            Redirect::temporary(to).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_gate_decisions() {
        assert_eq!(gate("/dashboard", false), GateDecision::Redirect(LOGIN_PATH));
        assert_eq!(
            gate("/dashboard/api/roster", false),
            GateDecision::Redirect(LOGIN_PATH)
        );
        assert_eq!(gate("/dashboard/daftar-hadir", true), GateDecision::Allow);
        assert_eq!(gate("/login", true), GateDecision::Redirect(DASHBOARD_HOME));
        assert_eq!(gate("/login", false), GateDecision::Allow);
        assert_eq!(gate("/", false), GateDecision::Allow);
        assert_eq!(gate("/api/check-ins", false), GateDecision::Allow);
    }

    #[test]
    fn test_cookie_parsing() {
        let header = "theme=dark; admin_session=1; other=x=y";
        assert_eq!(cookie_value(header, "admin_session"), Some("1"));
        assert_eq!(cookie_value(header, "other"), Some("x=y"));
        assert_eq!(cookie_value(header, "missing"), None);

        let mut headers = HeaderMap::new();
        assert!(!has_session(&headers, "admin_session"));
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("admin_session=1"));
        assert!(has_session(&headers, "admin_session"));

        // Presence is the session, even with an empty value
        let mut empty = HeaderMap::new();
        empty.insert(COOKIE, HeaderValue::from_static("admin_session="));
        assert!(has_session(&empty, "admin_session"));
        assert_eq!(
            gate("/dashboard", has_session(&empty, "admin_session")),
            GateDecision::Allow
        );

        let mut other = HeaderMap::new();
        other.insert(COOKIE, HeaderValue::from_static("admin_session_old=1"));
        assert!(!has_session(&other, "admin_session"));
    }

    #[test]
    fn test_cookie_attributes() {
        let auth = AuthConfig::default();
        let dev = session_cookie(&auth, false);
        assert_eq!(
            dev,
            "admin_session=1; HttpOnly; Path=/; Max-Age=86400; SameSite=Lax"
        );
        assert!(session_cookie(&auth, true).ends_with("; Secure"));
        assert!(clear_cookie(&auth, false).starts_with("admin_session=; HttpOnly; Path=/; Max-Age=0"));
    }
}
