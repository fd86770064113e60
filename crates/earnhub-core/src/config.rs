// ── Runtime client configuration ──
//
// Describes *how* to talk to the backend and how the tracking flow is
// tuned. Never touches disk: the config crate builds a `ClientConfig`
// from profiles and hands it in.

use std::time::Duration;

use url::Url;

use earnhub_api::{TlsMode, TransportConfig};

pub const DEFAULT_API_URL: &str = "https://api.earnhubofficial.in/";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (local backends with self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for one backend connection and its tracking behaviour.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL.
    pub api_url: Url,
    pub tls: TlsVerification,
    /// Timeout for ordinary requests.
    pub timeout: Duration,
    /// Upper bound on a click registration; expiry counts as a network error.
    pub click_timeout: Duration,
    /// Delay after navigation before the fallback completion report fires.
    pub completion_delay: Duration,
    /// Whether uncorrelated clicks get a fallback completion report at all.
    pub fallback_completion: bool,
    /// How often the offer board re-hydrates the status cache. Zero = never.
    pub refresh_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            click_timeout: Duration::from_secs(15),
            completion_delay: Duration::from_secs(30),
            fallback_completion: true,
            refresh_interval: Duration::from_secs(15),
        }
    }
}

impl ClientConfig {
    /// Transport settings for the API gateway.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}
