// ── Core error types ──
//
// User-facing errors from earnhub-core. Consumers never see reqwest errors
// or JSON parse failures directly; the `From<earnhub_api::Error>` impl
// folds transport-layer failures into the tracking taxonomy below.

use strum::{AsRefStr, Display};
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Caller bug: a required identifier was missing. Never retried.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Transient transport failure, including timeouts.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The backend rejected the request.
    #[error("Server rejected the request (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// The session is gone (401 or never logged in).
    #[error("Session expired -- log in again")]
    AuthExpired,

    /// Login was refused.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Nothing usable was configured (no redirect target, bad URL, TLS).
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The backend answered with a shape we do not understand.
    #[error("Unexpected response from backend: {message}")]
    Decode { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse failure tag used to decide user-visible behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum FailureReason {
    Validation,
    Network,
    Server,
    AuthExpired,
    Configuration,
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn reason(&self) -> FailureReason {
        match self {
            Self::Validation { .. } => FailureReason::Validation,
            Self::Network { .. } => FailureReason::Network,
            Self::Server { .. } | Self::Decode { .. } | Self::Internal(_) => FailureReason::Server,
            Self::AuthExpired | Self::Authentication { .. } => FailureReason::AuthExpired,
            Self::Configuration { .. } => FailureReason::Configuration,
        }
    }

    /// Only transport failures are worth an explicit user retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<earnhub_api::Error> for CoreError {
    fn from(err: earnhub_api::Error) -> Self {
        use earnhub_api::Error as Api;

        match err {
            Api::Authentication { message } => Self::Authentication { message },
            Api::SessionExpired | Api::NotAuthenticated => Self::AuthExpired,
            Api::Transport(e) => match e.status() {
                Some(status) => Self::Server {
                    status: status.as_u16(),
                    message: e.to_string(),
                },
                None => Self::Network {
                    message: e.to_string(),
                },
            },
            Api::Timeout { timeout_secs } => Self::Network {
                message: format!("request timed out after {timeout_secs}s"),
            },
            Api::InvalidUrl(e) => Self::Configuration {
                message: format!("invalid URL: {e}"),
            },
            Api::Tls(msg) => Self::Configuration {
                message: format!("TLS error: {msg}"),
            },
            Api::Api { status, message } => Self::Server { status, message },
            Api::Decode { message, body: _ } => Self::Decode { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_fold_into_taxonomy() {
        let timeout = CoreError::from(earnhub_api::Error::Timeout { timeout_secs: 15 });
        assert_eq!(timeout.reason(), FailureReason::Network);
        assert!(timeout.is_retryable());

        let expired = CoreError::from(earnhub_api::Error::SessionExpired);
        assert_eq!(expired.reason(), FailureReason::AuthExpired);

        let rejected = CoreError::from(earnhub_api::Error::Api {
            status: 422,
            message: "Offer is inactive".into(),
        });
        assert_eq!(rejected.reason(), FailureReason::Server);
        assert!(!rejected.is_retryable());
    }

    #[test]
    fn reason_renders_kebab_case() {
        assert_eq!(FailureReason::AuthExpired.to_string(), "auth-expired");
        assert_eq!(FailureReason::Configuration.as_ref(), "configuration");
    }
}
