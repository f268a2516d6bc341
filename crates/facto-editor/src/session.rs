//! Compile session controller.
//!
//! Sits above the protocol client and owns everything the core deliberately
//! does not: the compiling-state guard, a result cache keyed by a
//! fingerprint of (source, options), queue-position display, and the
//! connectivity indicator. The controller is also the observer the
//! streaming client delivers into.

use std::collections::HashMap;
use std::fmt;

use anyhow::{bail, Result};
use facto_client::{CompileClient, CompileObserver, CompileRequest};
use tracing::{error, info};

/// Tri-state backend connectivity indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Connected,
    Connecting,
    Disconnected,
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// What one compile attempt produced.
#[derive(Debug, Clone)]
pub struct CompileOutcome {
    /// Whether a blueprint was produced.
    pub success: bool,
    pub blueprint: Option<String>,
    pub json: Option<String>,
    pub errors: Vec<String>,
    /// Whether the result was replayed from the session cache.
    pub from_cache: bool,
}

/// Successful artifacts kept for replay.
#[derive(Debug, Clone)]
struct CachedArtifacts {
    blueprint: Option<String>,
    json: Option<String>,
}

/// Fingerprint of (source, options), the result-cache key.
///
/// Fields are hashed with NUL separators so adjacent values cannot run
/// together.
pub fn fingerprint(request: &CompileRequest) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(request.source.as_bytes());
    hasher.update(b"\0");
    if let Some(poles) = request.power_poles {
        hasher.update(poles.to_string().as_bytes());
    }
    hasher.update(b"\0");
    if let Some(name) = &request.blueprint_name {
        hasher.update(name.as_bytes());
    }
    hasher.update(b"\0");
    hasher.update(&[u8::from(request.no_optimize), u8::from(request.json_output)]);
    hasher.update(request.log_level.to_string().as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Collects stream output while narrating progress to the log.
#[derive(Default)]
struct StreamCollector {
    blueprint: Option<String>,
    json: Option<String>,
    errors: Vec<String>,
}

impl CompileObserver for StreamCollector {
    fn on_log(&mut self, content: &str) {
        info!("{content}");
    }

    fn on_status(&mut self, content: &str) {
        info!("{content}");
    }

    fn on_queue(&mut self, position: u32) {
        if position == 0 {
            info!("queue slot acquired — compiling");
        } else {
            info!(position, "waiting in backend queue");
        }
    }

    fn on_blueprint(&mut self, content: &str) {
        self.blueprint = Some(content.to_owned());
    }

    fn on_json(&mut self, content: &str) {
        self.json = Some(content.to_owned());
    }

    fn on_error(&mut self, message: &str) {
        error!("{message}");
        self.errors.push(message.to_owned());
    }
}

/// One editor session against one backend.
pub struct CompileSession {
    client: CompileClient,
    compiling: bool,
    connectivity: Connectivity,
    cache: HashMap<String, CachedArtifacts>,
}

impl CompileSession {
    pub fn new(client: CompileClient) -> Self {
        Self {
            client,
            compiling: false,
            connectivity: Connectivity::Disconnected,
            cache: HashMap::new(),
        }
    }

    pub fn is_compiling(&self) -> bool {
        self.compiling
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Probe the backend and update the connectivity indicator. A healthy
    /// backend also gets the session registered, fire-and-forget.
    pub async fn probe(&mut self) -> Connectivity {
        self.connectivity = Connectivity::Connecting;
        self.connectivity = if self.client.check_health().await {
            if !self.client.record_connection().await {
                info!("backend healthy but session registration was not acknowledged");
            }
            Connectivity::Connected
        } else {
            Connectivity::Disconnected
        };
        self.connectivity
    }

    /// Compile over the streaming endpoint.
    ///
    /// A second compile while one is in flight is rejected before any
    /// network activity, as is an invalid request. A fingerprint match in
    /// the session cache replays the stored artifacts without touching the
    /// backend.
    pub async fn compile(&mut self, request: &CompileRequest) -> Result<CompileOutcome> {
        self.begin(request)?;
        if let Some(outcome) = self.replay_cached(request) {
            return Ok(outcome);
        }

        self.compiling = true;
        let mut collector = StreamCollector::default();
        self.client.compile_streaming(request, &mut collector).await;
        self.compiling = false;

        let outcome = CompileOutcome {
            success: collector.blueprint.is_some(),
            blueprint: collector.blueprint,
            json: collector.json,
            errors: collector.errors,
            from_cache: false,
        };
        self.store(request, &outcome);
        Ok(outcome)
    }

    /// Compile over the atomic sync endpoint. Same guard and cache as the
    /// streaming path; HTTP-level failures propagate as errors here.
    pub async fn compile_sync(&mut self, request: &CompileRequest) -> Result<CompileOutcome> {
        self.begin(request)?;
        if let Some(outcome) = self.replay_cached(request) {
            return Ok(outcome);
        }

        self.compiling = true;
        let result = self.client.compile_sync(request).await;
        self.compiling = false;
        let result = result?;

        for line in &result.logs {
            info!("{line}");
        }
        if let Some(status) = &result.status {
            info!("{status}");
        }
        for message in &result.errors {
            error!("{message}");
        }

        let outcome = CompileOutcome {
            success: result.success,
            blueprint: result.blueprint,
            json: result.json,
            errors: result.errors,
            from_cache: false,
        };
        self.store(request, &outcome);
        Ok(outcome)
    }

    fn begin(&self, request: &CompileRequest) -> Result<()> {
        if self.compiling {
            bail!("a compilation is already in flight");
        }
        request.validate()?;
        Ok(())
    }

    fn replay_cached(&self, request: &CompileRequest) -> Option<CompileOutcome> {
        let cached = self.cache.get(&fingerprint(request))?;
        info!("result cache hit — replaying stored artifacts");
        Some(CompileOutcome {
            success: true,
            blueprint: cached.blueprint.clone(),
            json: cached.json.clone(),
            errors: Vec::new(),
            from_cache: true,
        })
    }

    fn store(&mut self, request: &CompileRequest, outcome: &CompileOutcome) {
        if outcome.success {
            self.cache.insert(
                fingerprint(request),
                CachedArtifacts {
                    blueprint: outcome.blueprint.clone(),
                    json: outcome.json.clone(),
                },
            );
        }
    }

    #[cfg(test)]
    fn force_compiling(&mut self, value: bool) {
        self.compiling = value;
    }

    #[cfg(test)]
    fn seed_cache(&mut self, request: &CompileRequest, blueprint: &str) {
        self.cache.insert(
            fingerprint(request),
            CachedArtifacts {
                blueprint: Some(blueprint.to_owned()),
                json: None,
            },
        );
    }

    #[cfg(test)]
    fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facto_client::BackendConfig;

    /// A client pointed at a port nothing listens on.
    async fn unreachable_client() -> CompileClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        CompileClient::new(BackendConfig::new(base_url))
    }

    #[test]
    fn fingerprint_is_stable_and_option_sensitive() {
        let request = CompileRequest::new("Signal a = 1;");
        assert_eq!(fingerprint(&request), fingerprint(&request));

        let mut no_optimize = request.clone();
        no_optimize.no_optimize = true;
        assert_ne!(fingerprint(&request), fingerprint(&no_optimize));

        let mut named = request.clone();
        named.blueprint_name = Some("adder".into());
        assert_ne!(fingerprint(&request), fingerprint(&named));
    }

    #[tokio::test]
    async fn guard_rejects_compile_while_one_is_in_flight() {
        let mut session = CompileSession::new(unreachable_client().await);
        session.force_compiling(true);
        let err = session
            .compile(&CompileRequest::new("Signal a = 1;"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already in flight"));
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_before_any_network_activity() {
        let mut session = CompileSession::new(unreachable_client().await);
        assert!(session.compile(&CompileRequest::new("   ")).await.is_err());
    }

    #[tokio::test]
    async fn cache_hit_replays_without_touching_the_backend() {
        let mut session = CompileSession::new(unreachable_client().await);
        let request = CompileRequest::new("Signal a = 1;");
        session.seed_cache(&request, "0eNG...");

        let outcome = session.compile(&request).await.unwrap();
        assert!(outcome.success);
        assert!(outcome.from_cache);
        assert_eq!(outcome.blueprint.as_deref(), Some("0eNG..."));
    }

    #[tokio::test]
    async fn failed_compiles_are_not_cached_and_guard_resets() {
        let mut session = CompileSession::new(unreachable_client().await);
        let request = CompileRequest::new("Signal a = 1;");

        let outcome = session.compile(&request).await.unwrap();
        assert!(!outcome.success);
        assert!(!outcome.errors.is_empty());
        assert_eq!(session.cache_len(), 0);
        assert!(!session.is_compiling());
    }

    #[tokio::test]
    async fn probe_reports_disconnected_for_unreachable_backend() {
        let mut session = CompileSession::new(unreachable_client().await);
        assert_eq!(session.probe().await, Connectivity::Disconnected);
        assert_eq!(session.connectivity(), Connectivity::Disconnected);
    }
}
