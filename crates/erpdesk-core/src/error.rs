// ── Core error types ──
//
// Every fetch, save and export failure is caught at the operation
// boundary and turned into one of these. `user_message()` is the only
// text a view ever shows; raw HTTP details stay in the logs.

use erpdesk_api::FieldErrors;
use thiserror::Error;

/// Shown when the backend could not be reached at all.
pub const NO_RESPONSE_MESSAGE: &str =
    "Sorry, You Are Not Allowed to Access This Page. Please contact to admin";

/// Shown for any failure outside the known categories.
pub const SERVER_ERROR_MESSAGE: &str = "Server Error";

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Backend reachability ─────────────────────────────────────────
    #[error("No response from backend: {reason}")]
    NoResponse { reason: String },

    #[error("Unauthorized: {code}")]
    Unauthorized { code: String },

    // ── Validation ───────────────────────────────────────────────────
    /// Rejected locally, before any backend call.
    #[error("Invalid input: {errors}")]
    Invalid { errors: FieldErrors },

    /// Rejected by the backend with HTTP 400.
    #[error("Rejected by backend: {errors}")]
    Rejected { errors: FieldErrors },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response: {message}")]
    Decode { message: String },

    // ── Local operation errors ───────────────────────────────────────
    #[error("No edit session is open")]
    SessionClosed,

    #[error("Export failed: {message}")]
    Export { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The single message a view shows for this failure.
    ///
    /// - no response: the fixed access message
    /// - 400 (or local validation): first field message, falling back to `non_field_errors`
    /// - 401: the backend's error code
    /// - anything else: `Server Error`
    pub fn user_message(&self) -> String {
        match self {
            Self::NoResponse { .. } => NO_RESPONSE_MESSAGE.to_owned(),
            Self::Invalid { errors } | Self::Rejected { errors } => {
                let field = errors
                    .0
                    .iter()
                    .find(|(k, msgs)| k.as_str() != FieldErrors::NON_FIELD && !msgs.is_empty());
                if let Some((key, msgs)) = field {
                    format!("{key}: {}", msgs.join(", "))
                } else {
                    errors
                        .get(FieldErrors::NON_FIELD)
                        .map(|m| m.join(", "))
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| SERVER_ERROR_MESSAGE.to_owned())
                }
            }
            Self::Unauthorized { code } => code.clone(),
            Self::SessionClosed
            | Self::Export { .. }
            | Self::Config { .. } => self.to_string(),
            Self::NotFound { .. }
            | Self::Server { .. }
            | Self::Decode { .. }
            | Self::Internal(_) => SERVER_ERROR_MESSAGE.to_owned(),
        }
    }

    /// One message per backend or local validation message, for the error queue.
    ///
    /// Field messages are prefixed `"field: "`; non-field messages are shown bare.
    pub fn field_messages(&self) -> Vec<String> {
        match self {
            Self::Invalid { errors } | Self::Rejected { errors } => errors
                .0
                .iter()
                .flat_map(|(field, msgs)| {
                    msgs.iter().map(move |m| {
                        if field == FieldErrors::NON_FIELD {
                            m.clone()
                        } else {
                            format!("{field}: {m}")
                        }
                    })
                })
                .collect(),
            other => vec![other.user_message()],
        }
    }

    /// Field errors carried by a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Invalid { errors } | Self::Rejected { errors } => Some(errors),
            _ => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Invalid { .. } | Self::SessionClosed)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<erpdesk_api::Error> for CoreError {
    fn from(err: erpdesk_api::Error) -> Self {
        match err {
            erpdesk_api::Error::InvalidToken { message } => CoreError::Config {
                message: format!("invalid token: {message}"),
            },
            erpdesk_api::Error::Unauthorized { code } => CoreError::Unauthorized { code },
            erpdesk_api::Error::Transport(e) => match e.status() {
                None => CoreError::NoResponse {
                    reason: e.to_string(),
                },
                Some(status) => CoreError::Server {
                    status: status.as_u16(),
                    message: e.to_string(),
                },
            },
            erpdesk_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            erpdesk_api::Error::Timeout { timeout_secs } => CoreError::NoResponse {
                reason: format!("timed out after {timeout_secs}s"),
            },
            erpdesk_api::Error::Tls(reason) => CoreError::NoResponse { reason },
            erpdesk_api::Error::Validation { errors } => CoreError::Rejected { errors },
            erpdesk_api::Error::NotFound { path } => CoreError::NotFound { path },
            erpdesk_api::Error::Http { status, message } => CoreError::Server { status, message },
            erpdesk_api::Error::Deserialization { message, body: _ } => {
                CoreError::Decode { message }
            }
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Export {
            message: err.to_string(),
        }
    }
}

impl From<csv::Error> for CoreError {
    fn from(err: csv::Error) -> Self {
        CoreError::Export {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn rejected(pairs: &[(&str, &str)]) -> CoreError {
        let mut errors = FieldErrors::default();
        for (k, v) in pairs {
            errors.0.entry((*k).to_owned()).or_default().push((*v).to_owned());
        }
        CoreError::Rejected { errors }
    }

    #[test]
    fn no_response_uses_access_message() {
        let err = CoreError::NoResponse {
            reason: "connection refused".into(),
        };
        assert_eq!(err.user_message(), NO_RESPONSE_MESSAGE);
    }

    #[test]
    fn bad_request_prefers_field_message() {
        let err = rejected(&[("non_field_errors", "duplicate"), ("pan_number", "required")]);
        assert_eq!(err.user_message(), "pan_number: required");
    }

    #[test]
    fn bad_request_falls_back_to_non_field() {
        let err = rejected(&[("non_field_errors", "Unique constraint failed")]);
        assert_eq!(err.user_message(), "Unique constraint failed");
    }

    #[test]
    fn unauthorized_shows_code() {
        let err = CoreError::Unauthorized {
            code: "token_not_valid".into(),
        };
        assert_eq!(err.user_message(), "token_not_valid");
    }

    #[test]
    fn other_failures_are_server_error() {
        let err = CoreError::Server {
            status: 502,
            message: "bad gateway".into(),
        };
        assert_eq!(err.user_message(), SERVER_ERROR_MESSAGE);
    }

    #[test]
    fn field_messages_flatten_in_order() {
        let err = rejected(&[
            ("products", "This field may not be empty."),
            ("non_field_errors", "Lead incomplete"),
            ("products", "Rate required"),
        ]);
        assert_eq!(
            err.field_messages(),
            vec![
                "products: This field may not be empty.",
                "products: Rate required",
                "Lead incomplete",
            ]
        );
    }

    #[test]
    fn api_validation_maps_to_rejected() {
        let api = erpdesk_api::Error::Validation {
            errors: FieldErrors::single("pan_number", "required"),
        };
        let err = CoreError::from(api);
        assert!(matches!(err, CoreError::Rejected { .. }));
        assert!(!err.is_local());
    }
}
