// ── Core error types ──
//
// Errors surfaced by zpa-core. Consumers never match on HTTP details; the
// `From<zpa_api::Error>` impl folds transport failures into these variants
// and keeps the not-found distinction intact.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the ZPA API at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// The API error code (e.g. `resource.not.found`).
        code: Option<String>,
        /// HTTP status code, when one was received.
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// `true` when the target object does not exist remotely.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } | Self::Api { status: Some(404), .. } => true,
            Self::Api { code, .. } => code.as_deref() == Some(zpa_api::error::RESOURCE_NOT_FOUND_CODE),
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<zpa_api::Error> for CoreError {
    fn from(err: zpa_api::Error) -> Self {
        match err {
            zpa_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            zpa_api::Error::InvalidCredentials => CoreError::AuthenticationFailed {
                message: "bearer token rejected after a fresh sign-in".into(),
            },
            zpa_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e.url().map(ToString::to_string).unwrap_or_default(),
                        reason: e.to_string(),
                    }
                } else if e.status().map(|s| s.as_u16()) == Some(404) {
                    CoreError::NotFound {
                        entity_type: "resource".into(),
                        identifier: e.url().map(|u| u.path().to_string()).unwrap_or_default(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            zpa_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            zpa_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            zpa_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            zpa_api::Error::RateLimited { retry_after_secs } => CoreError::Api {
                message: format!("Rate limited -- retry after {retry_after_secs}s"),
                code: Some("rate_limited".into()),
                status: Some(429),
            },
            zpa_api::Error::Api {
                message,
                code,
                status,
            } => CoreError::Api {
                message,
                code,
                status: Some(status),
            },
            zpa_api::Error::NotFound { resource, name } => CoreError::NotFound {
                entity_type: resource.into(),
                identifier: name,
            },
            zpa_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_survives_conversion() {
        let by_code: CoreError = zpa_api::Error::Api {
            message: "Application 7 does not exist".into(),
            code: Some("resource.not.found".into()),
            status: 400,
        }
        .into();
        let by_status: CoreError = zpa_api::Error::Api {
            message: "Not Found".into(),
            code: None,
            status: 404,
        }
        .into();
        let by_name: CoreError = zpa_api::Error::NotFound {
            resource: "segment group",
            name: "web".into(),
        }
        .into();
        let rejected: CoreError = zpa_api::Error::Api {
            message: "name already exists".into(),
            code: Some("duplicate.name".into()),
            status: 400,
        }
        .into();

        assert!(by_code.is_not_found());
        assert!(by_status.is_not_found());
        assert!(by_name.is_not_found());
        assert!(!rejected.is_not_found());
        assert_eq!(by_name.to_string(), "segment group not found: web");
    }
}
