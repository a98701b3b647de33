use anyhow::{anyhow, Result};
use common_auth::GatewayConfig;
use common_session::{FileSessionStore, InMemorySessionStore, SessionStore};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";
pub const DEFAULT_SESSION_FILE: &str = ".assistant-session.json";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub refresh_path: String,
    pub session_file: PathBuf,
    /// `false` keeps the session in process memory only.
    pub persist_session: bool,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        let api_url = env::var("ASSISTANT_API_URL")
            .ok()
            .and_then(|value| normalize_optional(&value))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(anyhow!(
                "ASSISTANT_API_URL must be an http(s) URL, got '{api_url}'"
            ));
        }

        let refresh_path = env::var("ASSISTANT_REFRESH_PATH")
            .ok()
            .and_then(|value| normalize_optional(&value))
            .unwrap_or_else(|| GatewayConfig::DEFAULT_REFRESH_PATH.to_string());

        let session_file = env::var("ASSISTANT_SESSION_FILE")
            .ok()
            .and_then(|value| normalize_optional(&value))
            .unwrap_or_else(|| DEFAULT_SESSION_FILE.to_string());

        let persist_session = bool_from_env("ASSISTANT_SESSION_PERSIST").unwrap_or(true);

        Ok(ClientConfig {
            api_url: api_url.trim_end_matches('/').to_string(),
            refresh_path,
            session_file: PathBuf::from(session_file),
            persist_session,
        })
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::new(self.api_url.clone()).with_refresh_path(self.refresh_path.clone())
    }

    pub fn session_store(&self) -> Arc<dyn SessionStore> {
        if self.persist_session {
            Arc::new(FileSessionStore::new(self.session_file.clone()))
        } else {
            Arc::new(InMemorySessionStore::new())
        }
    }
}

fn bool_from_env(key: &str) -> Option<bool> {
    env::var(key).ok().map(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
