use crate::error::{ChangeoverError, Result};

/// Engine configuration with environment overrides.
#[derive(Debug, Clone)]
pub struct ChangeoverConfig {
    /// SQLite URL for the embedded cache and key-value store.
    pub cache_url: String,
    /// Base URL of the remote step service (consumed by the application's
    /// transport implementation, not by this crate).
    pub remote_base_url: String,
    /// Whether reads opportunistically refresh the cache in the background.
    pub refresh_on_fetch: bool,
}

impl Default for ChangeoverConfig {
    fn default() -> Self {
        Self {
            cache_url: "sqlite://changeover_cache.db".to_string(),
            remote_base_url: "http://localhost:8080/api".to_string(),
            refresh_on_fetch: true,
        }
    }
}

impl ChangeoverConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(cache_url) = std::env::var("CHANGEOVER_CACHE_URL") {
            config.cache_url = cache_url;
        }

        if let Ok(remote_base_url) = std::env::var("CHANGEOVER_REMOTE_URL") {
            config.remote_base_url = remote_base_url;
        }

        if let Ok(refresh) = std::env::var("CHANGEOVER_REFRESH_ON_FETCH") {
            config.refresh_on_fetch = refresh.parse().map_err(|e| {
                ChangeoverError::Configuration {
                    message: format!("Invalid refresh_on_fetch: {e}"),
                }
            })?;
        }

        Ok(config)
    }
}
