//! CLI configuration: thin wrapper around `earnhub_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--api-url, --insecure, --timeout).

use std::time::Duration;

use earnhub_core::{ClientConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use earnhub_config::{
    Config, Profile, TokenStore, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// The active profile. A name given explicitly must exist; the implicit
/// default falls back to the public backend.
pub fn active_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, config);
    if global.profile.is_some() && !config.profiles.contains_key(&name) && global.api_url.is_none()
    {
        let mut available: Vec<_> = config.profiles.keys().cloned().collect();
        available.sort();
        return Err(CliError::ProfileNotFound {
            name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    }
    let profile = config.profile_or_default(&name);
    Ok((name, profile))
}

/// Translate a `Profile` + global flags into a `ClientConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(profile: &Profile, global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let mut config = earnhub_config::profile_to_client_config(profile)?;

    // 1. Backend URL (flag > env > profile)
    if let Some(ref url_str) = global.api_url {
        let mut url: url::Url = url_str.parse().map_err(|_| CliError::Validation {
            field: "api-url".into(),
            reason: format!("invalid URL: {url_str}"),
        })?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        config.api_url = url;
    }

    // 2. TLS verification
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }

    // 3. Timeout
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }

    Ok(config)
}
