//! Shared configuration for EarnHub tools.
//!
//! TOML profiles layered under `EARNHUB_*` environment overrides, session
//! token storage in the OS keyring, and translation to
//! `earnhub_core::ClientConfig`. The CLI adds flag-aware wrappers on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use earnhub_core::{ClientConfig, DEFAULT_API_URL, TlsVerification};

/// Keyring service name for stored session tokens.
pub const KEYRING_SERVICE: &str = "earnhub";
/// Overrides the stored session token.
pub const TOKEN_ENV: &str = "EARNHUB_TOKEN";
/// Overrides the config file location.
pub const CONFIG_ENV: &str = "EARNHUB_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
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

impl Config {
    /// Name of the profile to use: explicit > `default_profile` > "default".
    pub fn active_profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    /// The named profile, or a built-in one pointing at the public backend
    /// when nothing is configured under that name.
    pub fn profile_or_default(&self, name: &str) -> Profile {
        self.profiles.get(name).cloned().unwrap_or_else(|| Profile {
            insecure: Some(self.defaults.insecure),
            timeout: Some(self.defaults.timeout),
            ..Profile::default()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
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

/// A named backend profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Email pre-filled at login.
    pub email: Option<String>,

    /// Skip TLS verification (local backends with self-signed certs).
    pub insecure: Option<bool>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Request timeout in seconds.
    pub timeout: Option<u64>,

    /// Seconds after navigation before the fallback completion report.
    pub completion_delay_secs: Option<u64>,

    /// Report completion for clicks without a provider webhook.
    pub fallback_completion: Option<bool>,

    /// Status refresh period while waiting on an offer. 0 disables it.
    pub refresh_interval_secs: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            email: None,
            insecure: None,
            ca_cert: None,
            timeout: None,
            completion_delay_secs: None,
            fallback_completion: None,
            refresh_interval_secs: None,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `EARNHUB_CONFIG`, else the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("in", "earnhub", "earnhub").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("earnhub");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment.
///
/// Nested keys use a double underscore: `EARNHUB_DEFAULTS__TIMEOUT=60`,
/// `EARNHUB_PROFILES__STAGING__API_URL=...`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(
            Env::prefixed("EARNHUB_")
                .ignore(&["TOKEN", "CONFIG"])
                .split("__"),
        );

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is broken.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Session token storage ───────────────────────────────────────────

/// Persisted bearer token for one profile.
///
/// Lookup order: `EARNHUB_TOKEN`, then the OS keyring entry
/// `earnhub` / `<profile>/token`.
#[derive(Debug, Clone)]
pub struct TokenStore {
    profile: String,
}

impl TokenStore {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
        }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// `true` when the token comes from the environment and cannot be
    /// changed by `save`/`clear`.
    pub fn is_env_override() -> bool {
        std::env::var(TOKEN_ENV).is_ok_and(|t| !t.trim().is_empty())
    }

    pub fn load(&self) -> Option<SecretString> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                debug!("using session token from {TOKEN_ENV}");
                return Some(SecretString::from(token));
            }
        }

        match self.entry().and_then(|e| e.get_password().map_err(ConfigError::from)) {
            Ok(token) => Some(SecretString::from(token)),
            Err(e) => {
                debug!(profile = %self.profile, error = %e, "no stored session token");
                None
            }
        }
    }

    pub fn save(&self, token: &SecretString) -> Result<(), ConfigError> {
        self.entry()?.set_password(token.expose_secret())?;
        debug!(profile = %self.profile, "session token stored");
        Ok(())
    }

    /// Remove the stored token. Returns `false` if there was none.
    pub fn clear(&self) -> Result<bool, ConfigError> {
        match self.entry()?.delete_credential() {
            Ok(()) => {
                debug!(profile = %self.profile, "session token removed");
                Ok(true)
            }
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, ConfigError> {
        Ok(keyring::Entry::new(
            KEYRING_SERVICE,
            &format!("{}/token", self.profile),
        )?)
    }
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `ClientConfig` from a profile.
pub fn profile_to_client_config(profile: &Profile) -> Result<ClientConfig, ConfigError> {
    let api_url: url::Url = profile
        .api_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL: {}", profile.api_url),
        })?;
    if !matches!(api_url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("expected http or https, got '{}'", api_url.scheme()),
        });
    }

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let defaults = ClientConfig::default();
    Ok(ClientConfig {
        api_url,
        tls,
        timeout: profile
            .timeout
            .map_or(defaults.timeout, Duration::from_secs),
        completion_delay: profile
            .completion_delay_secs
            .map_or(defaults.completion_delay, Duration::from_secs),
        fallback_completion: profile
            .fallback_completion
            .unwrap_or(defaults.fallback_completion),
        refresh_interval: profile
            .refresh_interval_secs
            .map_or(defaults.refresh_interval, Duration::from_secs),
        ..defaults
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn file_and_env_layers_merge() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                default_profile = "staging"

                [defaults]
                output = "json"

                [profiles.staging]
                api_url = "https://staging.earnhub.test/"
                email = "ops@earnhub.test"
                completion_delay_secs = 5
                "#,
            )?;
            jail.set_env("EARNHUB_DEFAULTS__TIMEOUT", "60");
            jail.set_env("EARNHUB_TOKEN", "not-a-config-key");

            let cfg = load_config_from(Path::new("config.toml")).unwrap();

            assert_eq!(cfg.active_profile_name(None), "staging");
            assert_eq!(cfg.active_profile_name(Some("prod")), "prod");
            assert_eq!(cfg.defaults.output, "json");
            assert_eq!(cfg.defaults.timeout, 60);
            let staging = &cfg.profiles["staging"];
            assert_eq!(staging.email.as_deref(), Some("ops@earnhub.test"));
            assert_eq!(staging.completion_delay_secs, Some(5));
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_| {
            let cfg = load_config_from(Path::new("absent.toml")).unwrap();
            assert_eq!(cfg, Config::default());
            Ok(())
        });
    }

    #[test]
    fn save_then_load_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                email: Some("asha@example.com".into()),
                fallback_completion: Some(false),
                ..Profile::default()
            },
        );

        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(loaded.profiles, cfg.profiles);
    }

    #[test]
    fn profile_translates_to_client_config() {
        let profile = Profile {
            api_url: "http://localhost:5000/".into(),
            insecure: Some(true),
            timeout: Some(5),
            completion_delay_secs: Some(10),
            fallback_completion: Some(false),
            refresh_interval_secs: Some(0),
            ..Profile::default()
        };

        let config = profile_to_client_config(&profile).unwrap();

        assert_eq!(config.api_url.as_str(), "http://localhost:5000/");
        assert_eq!(config.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.completion_delay, Duration::from_secs(10));
        assert!(!config.fallback_completion);
        assert!(config.refresh_interval.is_zero());
        assert_eq!(config.click_timeout, ClientConfig::default().click_timeout);
    }

    #[test]
    fn custom_ca_applies_when_not_insecure() {
        let profile = Profile {
            ca_cert: Some("/etc/ssl/earnhub.pem".into()),
            ..Profile::default()
        };

        let config = profile_to_client_config(&profile).unwrap();

        assert_eq!(
            config.tls,
            TlsVerification::CustomCa("/etc/ssl/earnhub.pem".into())
        );
    }

    #[test]
    fn bad_api_url_is_rejected() {
        for url in ["not a url", "ftp://earnhub.test/"] {
            let profile = Profile {
                api_url: url.into(),
                ..Profile::default()
            };
            assert!(matches!(
                profile_to_client_config(&profile),
                Err(ConfigError::Validation { .. })
            ));
        }
    }

    #[test]
    fn unconfigured_profile_falls_back_to_public_backend() {
        let cfg = Config::default();
        let profile = cfg.profile_or_default("default");
        assert_eq!(profile.api_url, DEFAULT_API_URL);
        assert_eq!(profile.timeout, Some(30));
    }
}
