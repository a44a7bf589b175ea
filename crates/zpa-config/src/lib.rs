//! Shared configuration for ZPA tooling.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext +
//! legacy credentials file), translation to `zpa_core::ProviderConfig`,
//! and tracing setup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::{BaseDirs, ProjectDirs};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use zpa_api::transport::{DEFAULT_TIMEOUT, RetryPolicy, TlsMode};
use zpa_api::Cloud;
use zpa_core::ProviderConfig;

pub const ENV_PREFIX: &str = "ZPA_";
pub const ENV_CLIENT_ID: &str = "ZPA_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "ZPA_CLIENT_SECRET";
pub const ENV_CUSTOMER_ID: &str = "ZPA_CUSTOMER_ID";
pub const ENV_CLOUD: &str = "ZPA_CLOUD";
pub const ENV_LOG: &str = "ZPA_LOG";

const KEYRING_SERVICE: &str = "zpa";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {what} configured for profile '{profile}'")]
    NoCredentials { profile: String, what: &'static str },

    #[error("profile '{0}' is not defined")]
    UnknownProfile(String),

    #[error("failed to read legacy credentials file {path}: {reason}")]
    LegacyCredentials { path: PathBuf, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("cannot install log subscriber: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Retries for rate-limited calls.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}
fn default_max_retries() -> u32 {
    5
}
fn default_log_level() -> String {
    "info".into()
}

/// A named tenant profile.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Profile {
    pub client_id: Option<String>,

    /// Plaintext secret (prefer keyring or `ZPA_CLIENT_SECRET`).
    pub client_secret: Option<String>,

    pub customer_id: Option<String>,

    /// `PRODUCTION`, `BETA` or `GOV`.
    pub cloud: Option<String>,

    /// Explicit API base URL; overrides `cloud`.
    pub base_url: Option<String>,

    /// Default microtenant for resources that name none.
    pub microtenant_id: Option<String>,

    /// PEM bundle for TLS-inspecting proxies.
    pub ca_cert: Option<PathBuf>,

    pub timeout: Option<u64>,

    pub max_retries: Option<u32>,
}

// ── Paths ───────────────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "zscaler", "zpa").map_or_else(
        || home_dir().join(".config").join("zpa").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// `~/.zpa/credentials.json`, as written by older tooling.
pub fn legacy_credentials_path() -> PathBuf {
    home_dir().join(".zpa").join("credentials.json")
}

fn home_dir() -> PathBuf {
    BaseDirs::new().map_or_else(|| PathBuf::from("."), |dirs| dirs.home_dir().to_path_buf())
}

// ── Loading & saving ────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` merged with `ZPA_`-prefixed environment variables.
///
/// Nested keys use a double underscore, e.g.
/// `ZPA_PROFILES__PROD__CLOUD=BETA`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

/// Pick the profile named `name`, else the configured default.
pub fn select_profile<'a>(
    cfg: &'a Config,
    name: Option<&'a str>,
) -> Result<(&'a str, &'a Profile), ConfigError> {
    let name = name
        .or(cfg.default_profile.as_deref())
        .unwrap_or("default");
    cfg.profiles
        .get(name)
        .map(|profile| (name, profile))
        .ok_or_else(|| ConfigError::UnknownProfile(name.into()))
}

// ── Legacy credentials file ─────────────────────────────────────────

/// Contents of `~/.zpa/credentials.json`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LegacyCredentials {
    #[serde(default)]
    pub zpa_client_id: String,
    #[serde(default)]
    pub zpa_client_secret: String,
    #[serde(default)]
    pub zpa_customer_id: String,
    #[serde(default)]
    pub zpa_cloud: String,
}

/// Read the legacy credentials file. A missing file is `Ok(None)`.
pub fn read_legacy_credentials(path: &Path) -> Result<Option<LegacyCredentials>, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| ConfigError::LegacyCredentials {
            path: path.to_path_buf(),
            reason: format!(
                "expected one JSON object with zpa_client_id, zpa_client_secret, \
                 zpa_customer_id and zpa_cloud: {e}"
            ),
        })
}

// ── Credential resolution ───────────────────────────────────────────

/// Where credentials are looked up, in chain order.
pub struct Sources<E> {
    /// Environment lookup.
    pub env: E,
    /// Consult the system keyring.
    pub keyring: bool,
    /// Legacy credentials file, if any.
    pub legacy_path: Option<PathBuf>,
}

impl Sources<fn(&str) -> Option<String>> {
    /// Process environment, system keyring, `~/.zpa/credentials.json`.
    pub fn system() -> Self {
        Self {
            env: |name| std::env::var(name).ok(),
            keyring: true,
            legacy_path: Some(legacy_credentials_path()),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Credentials of one profile after the chain was walked.
#[derive(Debug, Clone)]
pub struct ResolvedCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub customer_id: String,
    pub cloud: Option<String>,
}

/// Walk the credential chain for `profile`.
///
/// The secret comes from `ZPA_CLIENT_SECRET`, then the keyring entry
/// `<profile>/client-secret`, then the plaintext profile value, then the
/// legacy credentials file. Ids prefer the profile over the environment
/// over the legacy file.
pub fn resolve_credentials<E>(
    profile: &Profile,
    profile_name: &str,
    sources: &Sources<E>,
) -> Result<ResolvedCredentials, ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    let legacy = match &sources.legacy_path {
        Some(path) => read_legacy_credentials(path)?,
        None => None,
    };
    let legacy = legacy.unwrap_or_default();
    let missing = |what: &'static str| ConfigError::NoCredentials {
        profile: profile_name.into(),
        what,
    };

    let client_id = non_blank(profile.client_id.clone())
        .or_else(|| non_blank((sources.env)(ENV_CLIENT_ID)))
        .or_else(|| non_blank(Some(legacy.zpa_client_id.clone())))
        .ok_or_else(|| missing("client_id"))?;
    let customer_id = non_blank(profile.customer_id.clone())
        .or_else(|| non_blank((sources.env)(ENV_CUSTOMER_ID)))
        .or_else(|| non_blank(Some(legacy.zpa_customer_id.clone())))
        .ok_or_else(|| missing("customer_id"))?;
    let cloud = non_blank(profile.cloud.clone())
        .or_else(|| non_blank((sources.env)(ENV_CLOUD)))
        .or_else(|| non_blank(Some(legacy.zpa_cloud.clone())));

    let client_secret = if let Some(secret) = non_blank((sources.env)(ENV_CLIENT_SECRET)) {
        secret
    } else if let Some(secret) = sources
        .keyring
        .then(|| keyring_secret(profile_name))
        .flatten()
    {
        secret
    } else if let Some(secret) = non_blank(profile.client_secret.clone()) {
        secret
    } else {
        non_blank(Some(legacy.zpa_client_secret))
            .ok_or_else(|| missing("client_secret"))?
    };

    Ok(ResolvedCredentials {
        client_id,
        client_secret: SecretString::from(client_secret),
        customer_id,
        cloud,
    })
}

fn keyring_secret(profile_name: &str) -> Option<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/client-secret"));
    match entry.and_then(|e| e.get_password()) {
        Ok(secret) => Some(secret),
        Err(e) => {
            debug!(profile = profile_name, error = %e, "no keyring secret");
            None
        }
    }
}

/// Store a client secret in the system keyring for `profile_name`.
pub fn store_secret(profile_name: &str, secret: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/client-secret"))
        .and_then(|entry| entry.set_password(secret))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

// ── Translation to ProviderConfig ───────────────────────────────────

/// Build a `ProviderConfig` from a profile and the global defaults.
pub fn profile_to_provider_config<E>(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    sources: &Sources<E>,
) -> Result<ProviderConfig, ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    let creds = resolve_credentials(profile, profile_name, sources)?;

    let mut config = ProviderConfig::new(creds.client_id, creds.client_secret, creds.customer_id);

    if let Some(cloud) = creds.cloud {
        config.cloud = Cloud::from_str(&cloud).map_err(|_| ConfigError::Validation {
            field: "cloud".into(),
            reason: format!("expected PRODUCTION, BETA or GOV, got '{cloud}'"),
        })?;
    }

    if let Some(raw) = non_blank(profile.base_url.clone()) {
        let url = raw.parse::<url::Url>().map_err(|_| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {raw}"),
        })?;
        config.base_url = Some(url);
    }

    config.microtenant_id = non_blank(profile.microtenant_id.clone());
    if let Some(ca) = &profile.ca_cert {
        config.tls = TlsMode::CustomCa(ca.clone());
    }
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.retry = RetryPolicy {
        max_retries: profile.max_retries.unwrap_or(defaults.max_retries),
        ..RetryPolicy::default()
    };

    Ok(config)
}

// ── Tracing ─────────────────────────────────────────────────────────

/// Install the global subscriber. `ZPA_LOG` overrides `defaults.log_level`.
pub fn init_tracing(defaults: &Defaults) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_env(ENV_LOG)
        .unwrap_or_else(|_| EnvFilter::new(&defaults.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = if defaults.log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| ConfigError::Logging(e.to_string()))
}
