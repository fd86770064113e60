//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use earnhub_config::ConfigError;
use earnhub_core::{CardError, CardErrorKind, CoreError, FailureReason};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the EarnHub backend")]
    #[diagnostic(
        code(earnhub::connection_failed),
        help(
            "Check your network connection and the profile's api_url.\n\
             Details: {message}"
        )
    )]
    ConnectionFailed { message: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(earnhub::timeout),
        help("Increase the timeout with --timeout or try again later.\nDetails: {message}")
    )]
    Timeout { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not logged in")]
    #[diagnostic(code(earnhub::not_logged_in), help("Run: earnhub login"))]
    NotLoggedIn,

    #[error("Session expired")]
    #[diagnostic(
        code(earnhub::session_expired),
        help("The stored token was rejected and has been removed.\nRun: earnhub login")
    )]
    SessionExpired,

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(earnhub::auth_failed),
        help("Check your email and password, then run: earnhub login")
    )]
    AuthFailed { message: String },

    #[error("This command requires an administrator account")]
    #[diagnostic(code(earnhub::forbidden))]
    Forbidden,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(earnhub::not_found),
        help("Run: earnhub {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Offer '{offer_id}' has no provider link")]
    #[diagnostic(
        code(earnhub::no_redirect_target),
        help("The click was recorded, but there is nowhere to send you. Contact support.")
    )]
    NoRedirectTarget { offer_id: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(earnhub::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(earnhub::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(earnhub::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: earnhub config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(earnhub::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(earnhub::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotLoggedIn | Self::SessionExpired | Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Forbidden => exit_code::PERMISSION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub fn not_found(resource_type: &str, identifier: &str, list_command: &str) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
            list_command: list_command.into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Network { message } => {
                if message.contains("timed out") {
                    CliError::Timeout { message }
                } else {
                    CliError::ConnectionFailed { message }
                }
            }

            CoreError::Server { status: 403, .. } => CliError::Forbidden,

            CoreError::Server { status, message } => CliError::ApiError {
                code: status.to_string(),
                message,
            },

            CoreError::AuthExpired => CliError::SessionExpired,

            CoreError::Authentication { message } => CliError::AuthFailed { message },

            CoreError::Configuration { message } => CliError::Validation {
                field: "configuration".into(),
                reason: message,
            },

            CoreError::Decode { message } => CliError::ApiError {
                code: "decode".into(),
                message,
            },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

impl From<earnhub_api::Error> for CliError {
    fn from(err: earnhub_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

/// A failed card activation for `offer_id`.
pub fn from_card_error(offer_id: &str, err: CardError) -> CliError {
    match err.kind {
        CardErrorKind::NoRedirectTarget => CliError::NoRedirectTarget {
            offer_id: offer_id.into(),
        },
        CardErrorKind::Failed(FailureReason::Network) => {
            if err.message.contains("timed out") {
                CliError::Timeout {
                    message: err.message,
                }
            } else {
                CliError::ConnectionFailed {
                    message: err.message,
                }
            }
        }
        CardErrorKind::Failed(FailureReason::AuthExpired) => CliError::SessionExpired,
        CardErrorKind::Failed(FailureReason::Validation) => CliError::Validation {
            field: "offer".into(),
            reason: err.message,
        },
        CardErrorKind::Failed(FailureReason::Server | FailureReason::Configuration) => {
            CliError::ApiError {
                code: err.kind.to_string(),
                message: err.message,
            }
        }
    }
}
