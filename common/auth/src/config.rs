/// Runtime configuration for the request gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Backend origin including the API prefix, e.g. `http://localhost:8080/api/v1`.
    pub base_url: String,
    /// Credential refresh endpoint, relative to `base_url`.
    pub refresh_path: String,
    pub user_agent: String,
}

impl GatewayConfig {
    pub const DEFAULT_REFRESH_PATH: &'static str = "/auth/refresh-token";

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            refresh_path: Self::DEFAULT_REFRESH_PATH.to_string(),
            user_agent: concat!("assistant-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Absolute URL for a path relative to the API prefix.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with(base) || path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.is_empty() {
            return base.to_string();
        }
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080/api/v1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_for_joins_without_doubling_slashes() {
        let config = GatewayConfig::new("http://api.local/api/v1/");
        assert_eq!(config.url_for("/chat"), "http://api.local/api/v1/chat");
        assert_eq!(config.url_for("documents"), "http://api.local/api/v1/documents");
        assert_eq!(
            config.url_for("http://api.local/api/v1/statistics"),
            "http://api.local/api/v1/statistics"
        );
    }

    #[test]
    fn defaults_point_at_refresh_endpoint() {
        let config = GatewayConfig::default();
        assert_eq!(config.refresh_path, "/auth/refresh-token");
        assert_eq!(
            config.url_for(&config.refresh_path),
            "http://localhost:8080/api/v1/auth/refresh-token"
        );
    }
}
