//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use erpdesk_config::ConfigError;
use erpdesk_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const VALIDATION: i32 = 5;
    pub const CONNECTION: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(erpdesk::no_response),
        help(
            "The backend did not answer.\n\
             Check the URL and your network, or try --insecure for self-signed certificates.\n\
             Detail: {reason}"
        )
    )]
    NoResponse { message: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {code}")]
    #[diagnostic(
        code(erpdesk::auth_failed),
        help("Store a fresh token with: erpdesk config set-token --profile {profile}")
    )]
    AuthFailed { profile: String, code: String },

    #[error("No token configured for profile '{profile}'")]
    #[diagnostic(
        code(erpdesk::no_credentials),
        help(
            "Store one with: erpdesk config set-token\n\
             Or set the ERPDESK_TOKEN environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Unknown resource '{key}'")]
    #[diagnostic(code(erpdesk::unknown_resource), help("Available resources: {available}"))]
    UnknownResource { key: String, available: String },

    #[error("Not found: {path}")]
    #[diagnostic(code(erpdesk::not_found))]
    NotFound { path: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("{}", messages.join("\n"))]
    #[diagnostic(code(erpdesk::rejected))]
    Rejected { messages: Vec<String> },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(erpdesk::validation))]
    Validation { field: String, reason: String },

    // ── Backend ──────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(erpdesk::server), help("Detail: {detail}"))]
    Server { message: String, detail: String },

    #[error("Export failed: {message}")]
    #[diagnostic(code(erpdesk::export))]
    Export { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(erpdesk::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: erpdesk config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(erpdesk::no_config),
        help(
            "Create one with: erpdesk config init\n\
             Or pass --url and --token.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(erpdesk::config))]
    Config { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(erpdesk::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(erpdesk::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoResponse { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::UnknownResource { .. } | Self::ProfileNotFound { .. } => {
                exit_code::NOT_FOUND
            }
            Self::Rejected { .. } | Self::Validation { .. } => exit_code::VALIDATION,
            Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub fn unknown_resource(key: &str) -> Self {
        Self::UnknownResource {
            key: key.to_owned(),
            available: erpdesk_core::catalog::keys().collect::<Vec<_>>().join(", "),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.user_message();
        match err {
            CoreError::NoResponse { reason } => Self::NoResponse { message, reason },
            CoreError::Unauthorized { code } => Self::AuthFailed {
                profile: "current".into(),
                code,
            },
            e @ (CoreError::Invalid { .. } | CoreError::Rejected { .. }) => Self::Rejected {
                messages: e.field_messages(),
            },
            CoreError::NotFound { path } => Self::NotFound { path },
            CoreError::Export { message } => Self::Export { message },
            CoreError::Config { message } => Self::Config { message },
            e @ (CoreError::Server { .. }
            | CoreError::Decode { .. }
            | CoreError::SessionClosed
            | CoreError::Internal(_)) => Self::Server {
                message,
                detail: e.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use erpdesk_core::NO_RESPONSE_MESSAGE;

    use super::*;

    #[test]
    fn unreachable_backend_is_a_connection_error() {
        let err = CliError::from(CoreError::NoResponse {
            reason: "connection refused".into(),
        });
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
        assert_eq!(err.to_string(), NO_RESPONSE_MESSAGE);
    }

    #[test]
    fn rejected_save_lists_every_field_message() {
        let mut errors = erpdesk_core::FieldErrors::default();
        errors.0.insert("pan_number".into(), vec!["required".into()]);
        errors.0.insert("gst_number".into(), vec!["too long".into()]);
        let err = CliError::from(CoreError::Rejected { errors });
        assert_eq!(err.exit_code(), exit_code::VALIDATION);
        assert_eq!(err.to_string(), "pan_number: required\ngst_number: too long");
    }

    #[test]
    fn unknown_resource_lists_catalog() {
        let err = CliError::unknown_resource("widgets");
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        let CliError::UnknownResource { available, .. } = err else {
            panic!("wrong variant");
        };
        assert!(available.contains("applicants"));
    }
}
