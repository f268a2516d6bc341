//! Backend endpoint configuration.
//!
//! The base URL is resolved once, at client construction: explicit override
//! first, then the `FACTO_BACKEND_URL` environment variable, then the
//! backend's default local port.

/// Default backend address (the backend binds port 3000 out of the box).
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Environment variable consulted when no explicit override is given.
pub const BASE_URL_ENV: &str = "FACTO_BACKEND_URL";

/// Resolved backend location plus endpoint path helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    base_url: String,
}

impl BackendConfig {
    /// Use an explicit base URL, normalizing any trailing slash.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// Resolve from `FACTO_BACKEND_URL`, falling back to [`DEFAULT_BASE_URL`].
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::new(DEFAULT_BASE_URL),
        }
    }

    /// Resolution order: explicit override, then environment, then default.
    pub fn resolve(override_url: Option<&str>) -> Self {
        match override_url {
            Some(url) => Self::new(url),
            None => Self::from_env(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn compile_url(&self) -> String {
        self.endpoint("/compile")
    }

    pub fn compile_sync_url(&self) -> String {
        self.endpoint("/compile/sync")
    }

    pub fn health_url(&self) -> String {
        self.endpoint("/health")
    }

    pub fn connect_url(&self) -> String {
        self.endpoint("/connect")
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_normalized() {
        let config = BackendConfig::new("http://example.com:3000///");
        assert_eq!(config.base_url(), "http://example.com:3000");
        assert_eq!(config.compile_url(), "http://example.com:3000/compile");
    }

    #[test]
    fn endpoint_join_never_doubles_slashes() {
        let config = BackendConfig::new("http://localhost:3000/");
        assert_eq!(config.health_url(), "http://localhost:3000/health");
        assert_eq!(
            config.compile_sync_url(),
            "http://localhost:3000/compile/sync"
        );
    }

    #[test]
    fn explicit_override_wins() {
        let config = BackendConfig::resolve(Some("http://backend:9000"));
        assert_eq!(config.base_url(), "http://backend:9000");
    }
}
