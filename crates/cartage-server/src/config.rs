use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{ServerError, ServerResult};

/// Service configuration, read from the environment.
///
/// Custom `Debug` implementation redacts `pull_secret` to keep the shared
/// secret out of log output.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Listen address.
    pub bind_addr: SocketAddr,
    /// Base URL used to build canonical locations for stored archives.
    pub public_base_url: Url,
    /// Base URL of the pull endpoint the scheduler calls per pending item.
    pub pull_endpoint_url: Url,
    /// Shared secret for the outbound authenticated call between the two
    /// stages.
    pub pull_secret: String,
    /// Drain deferral. Zero means the scheduler default.
    pub drain_delay: Duration,
    /// When set, batch state and archive content live on the filesystem
    /// under this directory; when unset, both are in-memory.
    pub data_dir: Option<PathBuf>,
    /// Timeout for outbound archive fetches and pull endpoint calls.
    pub fetch_timeout: Duration,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("bind_addr", &self.bind_addr)
            .field("public_base_url", &self.public_base_url.as_str())
            .field("pull_endpoint_url", &self.pull_endpoint_url.as_str())
            .field("pull_secret", &"[REDACTED]")
            .field("drain_delay", &self.drain_delay)
            .field("data_dir", &self.data_dir)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8787".parse().expect("valid default addr"),
            public_base_url: Url::parse("http://127.0.0.1:8787").expect("valid default url"),
            pull_endpoint_url: Url::parse("http://127.0.0.1:8787").expect("valid default url"),
            pull_secret: "insecure-dev-secret".into(),
            drain_delay: Duration::ZERO,
            data_dir: None,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults above.
    ///
    /// Variables:
    /// - `CARTAGE_BIND_ADDR` — listen address (default `127.0.0.1:8787`)
    /// - `CARTAGE_PUBLIC_BASE_URL` — canonical location base
    /// - `CARTAGE_PULL_ENDPOINT_URL` — pull stage base URL
    /// - `CARTAGE_PULL_SECRET` — shared secret between the stages
    /// - `CARTAGE_DRAIN_DELAY_MS` — drain deferral; 0/unset means default
    /// - `CARTAGE_DATA_DIR` — enable filesystem backends under this path
    /// - `CARTAGE_FETCH_TIMEOUT_SECS` — outbound call timeout (default 30)
    pub fn from_env() -> ServerResult<Self> {
        let defaults = Self::default();

        let bind_addr = match std::env::var("CARTAGE_BIND_ADDR") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ServerError::Config(format!("invalid CARTAGE_BIND_ADDR: {raw}")))?,
            Err(_) => defaults.bind_addr,
        };

        Ok(Self {
            bind_addr,
            public_base_url: env_url("CARTAGE_PUBLIC_BASE_URL", defaults.public_base_url)?,
            pull_endpoint_url: env_url("CARTAGE_PULL_ENDPOINT_URL", defaults.pull_endpoint_url)?,
            pull_secret: std::env::var("CARTAGE_PULL_SECRET").unwrap_or(defaults.pull_secret),
            drain_delay: Duration::from_millis(env_number("CARTAGE_DRAIN_DELAY_MS", 0)),
            data_dir: std::env::var("CARTAGE_DATA_DIR").ok().map(PathBuf::from),
            fetch_timeout: Duration::from_secs(env_number("CARTAGE_FETCH_TIMEOUT_SECS", 30)),
        })
    }
}

fn env_url(var: &str, default: Url) -> ServerResult<Url> {
    match std::env::var(var) {
        Ok(raw) => {
            Url::parse(&raw).map_err(|e| ServerError::Config(format!("invalid {var}: {e}")))
        }
        Err(_) => Ok(default),
    }
}

fn env_number(var: &str, default: u64) -> u64 {
    std::env::var(var)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
