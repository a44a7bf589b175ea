use secrecy::SecretString;
use serde::Deserialize;
use strum::{Display, EnumString};

/// The ZPA cloud a tenant lives in.
///
/// Determines the management API base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Cloud {
    /// Commercial production cloud.
    #[default]
    Production,
    /// Beta cloud.
    Beta,
    /// Government cloud.
    Gov,
}

impl Cloud {
    /// Management API base URL for this cloud.
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Production => "https://config.private.zscaler.com",
            Self::Beta => "https://config.zpabeta.net",
            Self::Gov => "https://config.zpagov.net",
        }
    }
}

/// API client credentials for one ZPA tenant.
///
/// Generated in the admin portal under API Keys.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub customer_id: String,
}

/// Body of a successful `POST /signin`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AuthToken {
    #[serde(default)]
    pub token_type: String,
    pub access_token: String,
}
