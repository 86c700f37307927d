//! Shared configuration for SPC Bridge tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), the
//! keypad-code user map, include metadata, and translation to
//! `spcbridge_core::BridgeConfig`.

mod include;
mod users;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use spcbridge_api::{BridgeCredentials, Channel, CredentialPair, DEFAULT_PORT};
use thiserror::Error;
use tracing::debug;

use spcbridge_core::{BridgeConfig, TlsVerification};

pub use include::{IncludeConfig, Inclusion, ZoneClass};
pub use users::{KeypadMap, UserEntry, UserIdentifyMethod};

const KEYRING_SERVICE: &str = "spcbridge";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {channel} password configured for profile '{profile}'")]
    NoCredentials { profile: String, channel: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named gateway profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Per-command timeout in seconds.
    #[serde(default = "default_command_timeout")]
    pub command_timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            command_timeout: default_command_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_command_timeout() -> u64 {
    10
}

/// A named gateway profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Gateway address: a URL, `host:port`, or bare host (port 8088).
    pub gateway: String,

    /// Use HTTPS when `gateway` has no scheme.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub secure: bool,

    /// Push channel URL, when not derivable from `gateway`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,

    // ── Credential pairs ──
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get_password: Option<String>,
    /// Environment variable holding the get password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get_password_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub put_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put_password_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_password_env: Option<String>,

    /// Path to custom CA certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification. Defaults to `true`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Override command timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_timeout: Option<u64>,

    /// How a code supplied with a command is interpreted.
    #[serde(default)]
    pub user_identify: UserIdentifyMethod,

    /// Keypad-code map, keyed by SPC user id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub users: BTreeMap<String, UserEntry>,

    /// Which entities consumers should show.
    #[serde(default)]
    pub include: IncludeConfig,
}

impl Profile {
    /// A profile for `gateway` with factory-default credentials.
    pub fn new(gateway: impl Into<String>) -> Self {
        Self {
            gateway: gateway.into(),
            ..Self::default()
        }
    }

    /// The gateway URL, normalised.
    pub fn gateway_url(&self) -> Result<url::Url, ConfigError> {
        parse_gateway_url(&self.gateway, self.secure)
    }

    /// The keypad map, validated.
    pub fn keypad_map(&self) -> Result<KeypadMap, ConfigError> {
        KeypadMap::from_users(&self.users)
    }
}

// ── Gateway address ─────────────────────────────────────────────────

/// Parse a gateway address. A missing scheme becomes `http` (`https` when
/// `secure`); a missing port becomes 8088.
pub fn parse_gateway_url(raw: &str, secure: bool) -> Result<url::Url, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ConfigError::validation("gateway", "no gateway address configured"));
    }

    let with_scheme = if raw.contains("://") {
        raw.to_owned()
    } else if secure {
        format!("https://{raw}")
    } else {
        format!("http://{raw}")
    };

    let mut url = url::Url::parse(&with_scheme)
        .map_err(|e| ConfigError::validation("gateway", format!("invalid address '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::validation(
            "gateway",
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::validation("gateway", format!("no host in '{raw}'")));
    }
    if url.port().is_none() && !raw.contains("://") {
        url.set_port(Some(DEFAULT_PORT))
            .map_err(|()| ConfigError::validation("gateway", "cannot set port"))?;
    }
    Ok(url)
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "spcbridge", "spcbridge").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("spcbridge");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + `SPCBRIDGE_` environment overrides.
///
/// Nested keys use a double underscore: `SPCBRIDGE_DEFAULTS__TIMEOUT=5`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SPCBRIDGE_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Factory-default username and password for `channel`.
fn factory_pair(channel: Channel) -> (&'static str, &'static str) {
    match channel {
        Channel::Get => ("get_user", "get_pwd"),
        Channel::Put => ("put_user", "put_pwd"),
        Channel::Ws => ("ws_user", "ws_pwd"),
    }
}

fn channel_name(channel: Channel) -> &'static str {
    match channel {
        Channel::Get => "get",
        Channel::Put => "put",
        Channel::Ws => "ws",
    }
}

/// Resolve one credential pair.
///
/// Password lookup order: the profile's `*_password_env` variable, the
/// system keyring (`spcbridge` / `{profile}/{channel}-password`), the
/// plaintext value. A profile still on the factory username falls back
/// to the factory password.
pub fn resolve_credential_pair(
    profile: &Profile,
    profile_name: &str,
    channel: Channel,
) -> Result<CredentialPair, ConfigError> {
    let (username, password, password_env) = match channel {
        Channel::Get => (&profile.get_username, &profile.get_password, &profile.get_password_env),
        Channel::Put => (&profile.put_username, &profile.put_password, &profile.put_password_env),
        Channel::Ws => (&profile.ws_username, &profile.ws_password, &profile.ws_password_env),
    };
    let (factory_user, factory_password) = factory_pair(channel);
    let name = channel_name(channel);
    let username = username.clone().unwrap_or_else(|| factory_user.to_owned());

    // 1. Env var named by the profile
    if let Some(env_name) = password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(pair(username, val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{name}-password")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(pair(username, secret));
        }
    }

    // 3. Plaintext in config
    if let Some(pw) = password {
        return Ok(pair(username, pw.clone()));
    }

    if username == factory_user {
        return Ok(pair(username, factory_password.to_owned()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
        channel: name.into(),
    })
}

fn pair(username: String, password: String) -> CredentialPair {
    CredentialPair {
        username,
        password: SecretString::from(password),
    }
}

/// Resolve all three pairs.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<BridgeCredentials, ConfigError> {
    Ok(BridgeCredentials {
        get: resolve_credential_pair(profile, profile_name, Channel::Get)?,
        put: resolve_credential_pair(profile, profile_name, Channel::Put)?,
        ws: resolve_credential_pair(profile, profile_name, Channel::Ws)?,
    })
}

/// Store a channel password in the system keyring.
pub fn store_password(
    profile_name: &str,
    channel: Channel,
    password: &str,
) -> Result<(), ConfigError> {
    let name = channel_name(channel);
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{name}-password"))
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| ConfigError::validation("keyring", e.to_string()))
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `BridgeConfig` from a profile, with no flag overrides.
pub fn profile_to_bridge_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<BridgeConfig, ConfigError> {
    let url = profile.gateway_url()?;
    let credentials = resolve_credentials(profile, profile_name)?;
    // Fail early on a bad keypad map rather than at the first command.
    profile.keypad_map()?;
    profile.include.validate()?;

    let mut config = BridgeConfig::new(url, credentials);
    config.tls = tls_for(profile);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.command_timeout =
        Duration::from_secs(profile.command_timeout.unwrap_or(defaults.command_timeout));
    if let Some(ref raw) = profile.ws_url {
        config.ws_url = Some(
            url::Url::parse(raw)
                .map_err(|e| ConfigError::validation("ws_url", format!("{raw}: {e}")))?,
        );
    }
    Ok(config)
}

/// TLS mode: explicit CA wins, then `insecure` (default on).
pub fn tls_for(profile: &Profile) -> TlsVerification {
    if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else if profile.insecure.unwrap_or(true) {
        TlsVerification::DangerAcceptInvalid
    } else {
        TlsVerification::SystemDefaults
    }
}
