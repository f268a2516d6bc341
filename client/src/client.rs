//! HTTP client for the Facto compile backend.

use std::time::Duration;

use crate::config::BackendConfig;

/// Timeout for the fire-and-forget connectivity probes.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for all four backend endpoints.
///
/// One instance is meant to live for the whole editor session; the
/// underlying connection pool is reused across compiles and probes. The
/// client does not coordinate concurrent compilations — the session
/// controller holds the compiling guard.
pub struct CompileClient {
    http: reqwest::Client,
    config: BackendConfig,
}

impl CompileClient {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Client against the environment-resolved backend.
    pub fn from_env() -> Self {
        Self::new(BackendConfig::from_env())
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Probe `GET /health`. Any transport failure or non-success status
    /// yields `false`; this never fails.
    pub async fn check_health(&self) -> bool {
        match self
            .http
            .get(self.config.health_url())
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Register this session via `POST /connect`, with the same
    /// failure-swallowing semantics as [`Self::check_health`].
    pub async fn record_connection(&self) -> bool {
        match self
            .http
            .post(self.config.connect_url())
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
