// ── Runtime connection configuration ──
//
// Describes how to reach one ZPA tenant. Carries credentials and
// transport tuning but never touches disk; `zpa-config` builds it.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use zpa_api::transport::{RetryPolicy, TlsMode, TransportConfig};
use zpa_api::{Cloud, Credentials, ZpaClient};

use crate::error::CoreError;

/// Configuration for one ZPA tenant.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub customer_id: String,
    /// Public cloud the tenant lives in. Ignored when `base_url` is set.
    pub cloud: Cloud,
    /// Explicit management API URL (private clouds, test servers).
    pub base_url: Option<Url>,
    /// Default microtenant for resources that do not name one.
    pub microtenant_id: Option<String>,
    pub tls: TlsMode,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ProviderConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: SecretString,
        customer_id: impl Into<String>,
    ) -> Self {
        let transport = TransportConfig::default();
        Self {
            client_id: client_id.into(),
            client_secret,
            customer_id: customer_id.into(),
            cloud: Cloud::default(),
            base_url: None,
            microtenant_id: None,
            tls: transport.tls,
            timeout: transport.timeout,
            retry: transport.retry,
        }
    }

    fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
            retry: self.retry,
            ..TransportConfig::default()
        }
    }

    /// Build an API client. Does not sign in; the first call does.
    pub fn connect(&self) -> Result<ZpaClient, CoreError> {
        for (field, value) in [
            ("client_id", &self.client_id),
            ("customer_id", &self.customer_id),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::Config {
                    message: format!("{field} must not be empty"),
                });
            }
        }

        let credentials = Credentials {
            client_id: self.client_id.trim().to_owned(),
            client_secret: self.client_secret.clone(),
            customer_id: self.customer_id.trim().to_owned(),
        };
        let transport = self.transport();
        let client = match &self.base_url {
            Some(url) => ZpaClient::with_base_url(url.as_str(), credentials, &transport)?,
            None => ZpaClient::new(credentials, self.cloud, &transport)?,
        };
        Ok(client)
    }
}
