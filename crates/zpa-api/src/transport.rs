// Shared transport configuration for building the reqwest::Client.
//
// TLS, timeout and rate-limit retry settings live here so the API client
// only deals with URLs, tokens and payloads.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// Default request timeout used by the management API client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(240);

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file (TLS-inspecting proxies).
    CustomCa(PathBuf),
}

/// How `429 Too Many Requests` responses are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            min_wait: Duration::from_secs(5),
            max_wait: Duration::from_secs(20),
        }
    }
}

impl RetryPolicy {
    /// Never retry.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Wait time for a rate-limited response, honoring `Retry-After`.
    pub fn wait_for(&self, retry_after_secs: Option<u64>) -> Duration {
        let requested = retry_after_secs.map_or(self.min_wait, Duration::from_secs);
        requested.clamp(self.min_wait, self.max_wait.max(self.min_wait))
    }
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("zpa-api/", env!("CARGO_PKG_VERSION")).into(),
            retry: RetryPolicy::default(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str());

        if let TlsMode::CustomCa(path) = &self.tls {
            let cert_pem = std::fs::read(path)
                .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
            let cert = reqwest::Certificate::from_pem(&cert_pem)
                .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}
