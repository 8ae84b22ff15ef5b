//! Admin login and the session guard in front of `/api/admin/*`.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use dropshop_core::session::{AdminSession, SESSION_COOKIE, SESSION_HEADER};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::{unauthorized, ApiFailure};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub session: AdminSession,
}

/// Reads the raw session JSON from the header, falling back to the cookie.
pub fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(SESSION_HEADER).and_then(|value| value.to_str().ok()) {
        return Some(value.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| match urlencoding::decode(value) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => value.to_string(),
        })
}

/// `Set-Cookie` value carrying the serialized session.
fn session_cookie(session: &AdminSession, max_age_secs: u64) -> Option<HeaderValue> {
    let json = serde_json::to_string(session).ok()?;
    let cookie = format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age_secs}",
        urlencoding::encode(&json)
    );
    HeaderValue::from_str(&cookie).ok()
}

pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let raw = session_from_headers(request.headers()).unwrap_or_default();
    let now_ms = Utc::now().timestamp_millis();
    let admin = &state.config.admin;
    let verdict = AdminSession::parse(&raw)
        .and_then(|session| session.validate(now_ms, admin.session_policy()).map(|()| session));

    match verdict {
        Ok(mut session) => {
            session.touch(now_ms);
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            if let Some(cookie) = session_cookie(&session, admin.session_timeout_secs) {
                headers.insert(header::SET_COOKIE, cookie);
            }
            if let Some(value) =
                serde_json::to_string(&session).ok().and_then(|json| HeaderValue::from_str(&json).ok())
            {
                headers.insert(SESSION_HEADER, value);
            }
            response
        }
        Err(error) => {
            warn!(
                event_name = "admin.session.rejected",
                path = %request.uri().path(),
                reason = %error,
                "admin request rejected"
            );
            unauthorized(error.to_string()).into_response()
        }
    }
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter().zip(right).fold(0u8, |diff, (a, b)| diff | (a ^ b)) == 0
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<LoginResponse>), ApiFailure> {
    let admin = &state.config.admin;
    let username_ok = constant_time_eq(request.username.trim().as_bytes(), admin.username.as_bytes());
    let password_ok =
        constant_time_eq(request.password.as_bytes(), admin.password.expose_secret().as_bytes());
    if !(username_ok && password_ok) {
        warn!(event_name = "admin.login.failed", "admin login rejected");
        return Err(unauthorized("invalid username or password"));
    }

    let session = AdminSession::start(Utc::now().timestamp_millis());
    let cookie_value = session_cookie(&session, admin.session_timeout_secs);

    let mut headers = HeaderMap::new();
    if let Some(cookie) = cookie_value {
        headers.insert(header::SET_COOKIE, cookie);
    }

    info!(event_name = "admin.login.succeeded", "admin session started");
    Ok((headers, Json(LoginResponse { success: true, session })))
}
