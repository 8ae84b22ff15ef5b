//! Admin session records carried by the browser.
//!
//! The session travels as JSON in a cookie or header. It is checked for shape
//! and age only; nothing here proves the server issued it.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SESSION_COOKIE: &str = "admin_session";
pub const SESSION_HEADER: &str = "x-admin-session";
pub const TOKEN_LENGTH: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    #[serde(alias = "isAuthenticated")]
    pub is_authenticated: bool,
    pub token: String,
    /// Epoch milliseconds.
    #[serde(alias = "loginTime")]
    pub login_time: i64,
    /// Epoch milliseconds.
    #[serde(alias = "lastActivity")]
    pub last_activity: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionPolicy {
    pub session_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self { session_timeout_secs: 3600, idle_timeout_secs: 1800 }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("admin session is missing")]
    Missing,
    #[error("admin session could not be parsed")]
    Malformed,
    #[error("admin session is not authenticated")]
    NotAuthenticated,
    #[error("admin session token has an invalid format")]
    InvalidToken,
    #[error("admin session has expired")]
    Expired,
    #[error("admin session timed out after inactivity")]
    Idle,
}

impl AdminSession {
    pub fn start(now_ms: i64) -> Self {
        Self {
            is_authenticated: true,
            token: generate_token(),
            login_time: now_ms,
            last_activity: now_ms,
        }
    }

    pub fn parse(raw: &str) -> Result<Self, SessionError> {
        if raw.trim().is_empty() {
            return Err(SessionError::Missing);
        }
        serde_json::from_str(raw).map_err(|_| SessionError::Malformed)
    }

    pub fn validate(&self, now_ms: i64, policy: SessionPolicy) -> Result<(), SessionError> {
        if !self.is_authenticated {
            return Err(SessionError::NotAuthenticated);
        }
        if !is_valid_token(&self.token) {
            return Err(SessionError::InvalidToken);
        }
        if elapsed_secs(self.login_time, now_ms) > policy.session_timeout_secs {
            return Err(SessionError::Expired);
        }
        if elapsed_secs(self.last_activity, now_ms) > policy.idle_timeout_secs {
            return Err(SessionError::Idle);
        }
        Ok(())
    }

    pub fn touch(&mut self, now_ms: i64) {
        self.last_activity = now_ms;
    }
}

pub fn generate_token() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(TOKEN_LENGTH).map(char::from).collect()
}

pub fn is_valid_token(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.bytes().all(|byte| byte.is_ascii_alphanumeric())
}

fn elapsed_secs(since_ms: i64, now_ms: i64) -> u64 {
    u64::try_from(now_ms.saturating_sub(since_ms)).unwrap_or(0) / 1000
}

#[cfg(test)]
mod tests {
    use super::{is_valid_token, AdminSession, SessionError, SessionPolicy};

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn fresh_session_is_valid() {
        let session = AdminSession::start(NOW);
        assert!(is_valid_token(&session.token));
        assert_eq!(session.validate(NOW + 1_000, SessionPolicy::default()), Ok(()));
    }

    #[test]
    fn token_must_be_64_alphanumerics() {
        assert!(!is_valid_token("short"));
        assert!(!is_valid_token(&"a".repeat(63)));
        assert!(!is_valid_token(&format!("{}-", "a".repeat(63))));
        assert!(is_valid_token(&"Z9".repeat(32)));
    }

    #[test]
    fn absolute_and_idle_timeouts_apply() {
        let policy = SessionPolicy::default();
        let mut session = AdminSession::start(NOW);

        assert_eq!(session.validate(NOW + 1_801_000, policy), Err(SessionError::Idle));

        session.touch(NOW + 1_800_000);
        assert_eq!(session.validate(NOW + 3_000_000, policy), Ok(()));
        assert_eq!(session.validate(NOW + 3_601_000, policy), Err(SessionError::Expired));
    }

    #[test]
    fn parse_accepts_camel_case_fields() {
        let raw = format!(
            r#"{{"isAuthenticated":true,"token":"{}","loginTime":{NOW},"lastActivity":{NOW}}}"#,
            "a".repeat(64)
        );
        let session = AdminSession::parse(&raw).expect("session should parse");
        assert!(session.is_authenticated);
        assert_eq!(AdminSession::parse("{not json"), Err(SessionError::Malformed));
        assert_eq!(AdminSession::parse(""), Err(SessionError::Missing));
    }

    #[test]
    fn unauthenticated_session_is_rejected_first() {
        let mut session = AdminSession::start(NOW);
        session.is_authenticated = false;
        session.token = "bad".to_string();
        assert_eq!(
            session.validate(NOW, SessionPolicy::default()),
            Err(SessionError::NotAuthenticated)
        );
    }
}
