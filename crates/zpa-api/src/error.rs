use thiserror::Error;

/// Error code the management API puts in the body of a missing-object response.
pub const RESOURCE_NOT_FOUND_CODE: &str = "resource.not.found";

/// Top-level error type for the `zpa-api` crate.
///
/// Covers sign-in, transport, and structured API failures.
/// `zpa-core` maps these into diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Sign-in failed (wrong client id/secret, disabled API key, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Bearer token rejected even after a fresh sign-in.
    #[error("Invalid API client credentials")]
    InvalidCredentials,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Still rate limited after the retry budget was spent.
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Management API ──────────────────────────────────────────────
    /// Structured error returned by the management API.
    #[error("ZPA API error (HTTP {status}): {message}")]
    Api {
        message: String,
        code: Option<String>,
        status: u16,
    },

    /// A lookup by name matched nothing.
    #[error("no {resource} named '{name}' was found")]
    NotFound { resource: &'static str, name: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the target object does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } | Self::NotFound { .. } => true,
            Self::Api { code, .. } => code.as_deref() == Some(RESOURCE_NOT_FOUND_CODE),
            _ => false,
        }
    }

    /// Extract the API error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_covers_status_and_code() {
        let by_status = Error::Api {
            message: "gone".into(),
            code: None,
            status: 404,
        };
        let by_code = Error::Api {
            message: "segment group 42 does not exist".into(),
            code: Some(RESOURCE_NOT_FOUND_CODE.into()),
            status: 400,
        };
        let by_name = Error::NotFound {
            resource: "segment group",
            name: "web".into(),
        };
        let other = Error::Api {
            message: "bad request".into(),
            code: Some("invalid.input".into()),
            status: 400,
        };

        assert!(by_status.is_not_found());
        assert!(by_code.is_not_found());
        assert!(by_name.is_not_found());
        assert!(!other.is_not_found());
        assert_eq!(other.api_error_code(), Some("invalid.input"));
    }
}
