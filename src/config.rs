// =============================================================================
// Scanner Configuration - defaults, optional JSON file, environment overrides
// =============================================================================
//
// Built once at startup and handed to the provider client and the HTTP server.
// Nothing reads the environment after this point.
//
// Layering: serde defaults < `scanner_config.json` < environment variables.
// The provider credential is never serialised and is redacted from `Debug`.
// =============================================================================

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const ENV_API_KEY: &str = "ALPHA_VANTAGE_API_KEY";
pub const ENV_BASE_URL: &str = "ALPHA_VANTAGE_BASE_URL";
pub const ENV_PORT: &str = "PORT";
pub const ENV_BIND_HOST: &str = "SCANNER_BIND_HOST";
pub const ENV_PUBLIC_DIR: &str = "SCANNER_PUBLIC_DIR";

// =============================================================================
// Default-value helpers
// =============================================================================

fn default_base_url() -> String {
    "https://www.alphavantage.co/query".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_request_timeout_secs() -> u64 {
    30
}

// =============================================================================
// ScannerConfig
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Provider credential. Absent means every provider call fails with a
    /// configuration error.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Provider query endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    /// Directory served for every non-API path.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    /// Transport-level timeout of the HTTP client. The scan itself sets none.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            port: default_port(),
            bind_host: default_bind_host(),
            public_dir: default_public_dir(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ScannerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("port", &self.port)
            .field("bind_host", &self.bind_host)
            .field("public_dir", &self.public_dir)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ScannerConfig {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scanner config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse scanner config from {}", path.display()))?;

        info!(path = %path.display(), port = config.port, "scanner config loaded");
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = get(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(url) = get(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(port) = get(ENV_PORT) {
            match port.parse::<u16>() {
                Ok(p) => self.port = p,
                Err(_) => warn!(value = %port, default = self.port, "ignoring unparsable PORT"),
            }
        }
        if let Some(host) = get(ENV_BIND_HOST) {
            self.bind_host = host;
        }
        if let Some(dir) = get(ENV_PUBLIC_DIR) {
            self.public_dir = PathBuf::from(dir);
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.bind_host, self.port))
    }
}
