// Session context
//
// One explicit object owns the bearer token and the cached profile for the
// lifetime of a login. It is handed to the gateway (and through it to every
// consumer) at construction time; nothing reads the token from ambient
// storage. Lifecycle transitions are published on a `watch` channel so that
// dependent state (card controllers, caches) can be discarded when the
// session ends.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::Error;
use crate::models::UserDto;

/// An authenticated user's session.
#[derive(Debug, Clone)]
pub struct Session {
    user_id: String,
    token: SecretString,
    profile: Option<UserDto>,
    expires_at: Option<DateTime<Utc>>,
}

/// The claims we read from the token payload. The signature is not
/// checked here; the backend is the authority on validity.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenClaims {
    user_id: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
}

impl Session {
    /// Build a session from a bearer token, extracting `userId` from the
    /// JWT payload segment.
    pub fn from_token(token: SecretString) -> Result<Self, Error> {
        let claims = decode_claims(token.expose_secret())?;
        let user_id = claims
            .user_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Error::Authentication {
                message: "token payload has no userId".into(),
            })?;
        let expires_at = claims.exp.and_then(|ts| DateTime::from_timestamp(ts, 0));

        Ok(Self {
            user_id,
            token,
            profile: None,
            expires_at,
        })
    }

    /// Attach (or replace) the cached display profile.
    pub fn with_profile(mut self, profile: UserDto) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn profile(&self) -> Option<&UserDto> {
        self.profile.as_ref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// `true` when the token carries an `exp` claim that lies in the past.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// `true` when the cached profile says this user is an admin.
    pub fn is_admin(&self) -> bool {
        self.profile
            .as_ref()
            .and_then(|p| p.role.as_deref())
            .is_some_and(|r| r.eq_ignore_ascii_case("admin"))
    }
}

fn decode_claims(token: &str) -> Result<TokenClaims, Error> {
    let payload = token.split('.').nth(1).ok_or_else(|| Error::Authentication {
        message: "token is not a JWT".into(),
    })?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| Error::Authentication {
            message: format!("token payload is not base64url: {e}"),
        })?;
    serde_json::from_slice(&bytes).map_err(|e| Error::Authentication {
        message: format!("token payload is not JSON: {e}"),
    })
}

// ── Lifecycle ────────────────────────────────────────────────────────

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Explicit logout.
    LoggedOut,
    /// The backend answered 401.
    Expired,
}

/// Observable lifecycle state.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// No session has been created yet.
    Anonymous,
    Active(Arc<Session>),
    Ended(SessionEnd),
}

impl SessionState {
    pub fn session(&self) -> Option<&Arc<Session>> {
        match self {
            Self::Active(s) => Some(s),
            Self::Anonymous | Self::Ended(_) => None,
        }
    }
}

/// Cheaply cloneable handle to the current session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    state: Arc<watch::Sender<SessionState>>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// A context with no session.
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Anonymous);
        Self {
            state: Arc::new(state),
        }
    }

    /// A context that starts out logged in.
    pub fn with_session(session: Session) -> Self {
        let ctx = Self::new();
        ctx.create(session);
        ctx
    }

    /// Install a session (login or registration). Replaces any previous one.
    pub fn create(&self, session: Session) {
        info!(user_id = %session.user_id, "session created");
        self.state.send_replace(SessionState::Active(Arc::new(session)));
    }

    /// Refresh the cached profile of the active session, if any.
    pub fn update_profile(&self, profile: UserDto) {
        self.state.send_if_modified(|state| {
            let SessionState::Active(session) = state else {
                return false;
            };
            let updated = Session::clone(session).with_profile(profile);
            *state = SessionState::Active(Arc::new(updated));
            true
        });
    }

    /// End the active session. Returns `false` if there was none.
    pub fn destroy(&self, reason: SessionEnd) -> bool {
        let destroyed = self.state.send_if_modified(|state| {
            if matches!(state, SessionState::Active(_)) {
                *state = SessionState::Ended(reason);
                true
            } else {
                false
            }
        });
        if destroyed {
            info!(?reason, "session destroyed");
        } else {
            debug!(?reason, "destroy requested with no active session");
        }
        destroyed
    }

    pub fn current(&self) -> Option<Arc<Session>> {
        self.state.borrow().session().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().session().is_some()
    }

    pub fn user_id(&self) -> Option<String> {
        self.state.borrow().session().map(|s| s.user_id.clone())
    }

    /// Snapshot of the lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn token_with(payload: &str) -> SecretString {
        let body = URL_SAFE_NO_PAD.encode(payload);
        SecretString::from(format!("eyJhbGciOiJIUzI1NiJ9.{body}.sig"))
    }

    #[test]
    fn from_token_reads_user_id() {
        let session =
            Session::from_token(token_with(r#"{"userId":"u-1","exp":4102444800}"#)).unwrap();
        assert_eq!(session.user_id(), "u-1");
        assert!(session.expires_at().is_some());
        assert!(!session.is_expired_at(Utc::now()));
    }

    #[test]
    fn from_token_rejects_missing_user_id() {
        let result = Session::from_token(token_with(r#"{"sub":"x"}"#));
        assert!(matches!(result, Err(Error::Authentication { .. })));
    }

    #[test]
    fn from_token_rejects_garbage() {
        let result = Session::from_token(SecretString::from("not-a-token".to_string()));
        assert!(matches!(result, Err(Error::Authentication { .. })));
    }

    #[test]
    fn destroy_only_fires_once() {
        let session = Session::from_token(token_with(r#"{"userId":"u-1"}"#)).unwrap();
        let ctx = SessionContext::with_session(session);
        let rx = ctx.subscribe();

        assert!(ctx.is_authenticated());
        assert!(ctx.destroy(SessionEnd::Expired));
        assert!(!ctx.destroy(SessionEnd::LoggedOut));
        assert!(!ctx.is_authenticated());
        assert!(matches!(
            *rx.borrow(),
            SessionState::Ended(SessionEnd::Expired)
        ));
    }
}
