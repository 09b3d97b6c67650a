//! Configuration loading and reconciliation
//!
//! The reconciler decides which [`RotationConfig`] is effective: the locally
//! persisted one, or a remotely fetched one cached in the store. Remote
//! fetches are validated with aggregated field errors and only persisted
//! when the result is materially different (structural equality) from what
//! is already cached, so an unchanged configuration never causes a rebuild.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::models::{keys, RemoteSettings, RotationConfig, ValidationError};
use crate::store::{get_typed, set_typed, StateStore, StoreError};

/// Result type for reconciler operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading, fetching or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required configuration key is absent from the store
    #[error("configuration '{0}' is not available")]
    Missing(&'static str),

    /// The remote configuration URL is not a valid URL
    #[error("invalid configuration URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The remote endpoint could not be fetched or decoded
    #[error("failed to load remote configuration from '{url}': {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The fetched configuration failed field validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Store access failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The configuration source selected by the persisted `useRemoteConfig` flag.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectiveConfig {
    /// Locally edited configuration
    Local(RotationConfig),

    /// Remote configuration: the cached copy (if any fetch succeeded before)
    /// plus the settings governing fetch and polling
    Remote {
        cached: Option<RotationConfig>,
        settings: RemoteSettings,
    },
}

/// Loads, fetches, validates and caches rotation configuration.
#[derive(Clone)]
pub struct ConfigReconciler {
    store: Arc<dyn StateStore>,
    http: reqwest::Client,
}

impl ConfigReconciler {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { store, http }
    }

    pub fn with_http_client(store: Arc<dyn StateStore>, http: reqwest::Client) -> Self {
        Self { store, http }
    }

    /// Resolve the effective configuration source from the store.
    ///
    /// A missing local configuration (or missing remote settings when the
    /// remote flag is set) is an error; a missing remote *cache* is not,
    /// since the first fetch may still be ahead.
    pub async fn load(&self) -> ConfigResult<EffectiveConfig> {
        let use_remote = get_typed::<bool>(self.store.as_ref(), keys::USE_REMOTE_CONFIG)
            .await?
            .unwrap_or(false);

        if use_remote {
            let settings = get_typed::<RemoteSettings>(self.store.as_ref(), keys::REMOTE_SETTINGS)
                .await?
                .ok_or(ConfigError::Missing(keys::REMOTE_SETTINGS))?;
            let cached =
                get_typed::<RotationConfig>(self.store.as_ref(), keys::REMOTE_CONFIG).await?;
            debug!(
                config_url = %settings.config_url,
                cached = cached.is_some(),
                "effective configuration is remote"
            );
            Ok(EffectiveConfig::Remote { cached, settings })
        } else {
            let config = get_typed::<RotationConfig>(self.store.as_ref(), keys::LOCAL_CONFIG)
                .await?
                .ok_or(ConfigError::Missing(keys::LOCAL_CONFIG))?;
            debug!(pages = config.pages.len(), "effective configuration is local");
            Ok(EffectiveConfig::Local(config))
        }
    }

    /// Fetch and validate the remote configuration.
    pub async fn fetch(&self, settings: &RemoteSettings) -> ConfigResult<RotationConfig> {
        let raw = settings.config_url.trim();
        let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        debug!(%url, "fetching remote configuration");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ConfigError::Fetch {
                url: raw.to_string(),
                source: e,
            })?;

        let config: RotationConfig =
            response.json().await.map_err(|e| ConfigError::Fetch {
                url: raw.to_string(),
                source: e,
            })?;

        config.validate()?;
        info!(pages = config.pages.len(), "remote configuration loaded");
        Ok(config)
    }

    /// Persist a freshly fetched remote configuration as the cached copy.
    pub async fn cache_remote(&self, config: &RotationConfig) -> ConfigResult<()> {
        self.persist(keys::REMOTE_CONFIG, config).await
    }

    async fn persist<T: Serialize>(&self, key: &'static str, value: &T) -> ConfigResult<()> {
        set_typed(self.store.as_ref(), key, value).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageSpec;
    use crate::store::MemoryStore;

    fn config(urls: &[&str]) -> RotationConfig {
        RotationConfig {
            pages: urls.iter().map(|u| PageSpec::new(*u, 5, 0)).collect(),
            is_fullscreen: false,
        }
    }

    #[tokio::test]
    async fn test_load_local() {
        let store = Arc::new(MemoryStore::new());
        set_typed(store.as_ref(), keys::LOCAL_CONFIG, &config(&["https://a.example"]))
            .await
            .unwrap();

        let reconciler = ConfigReconciler::new(store);
        match reconciler.load().await.unwrap() {
            EffectiveConfig::Local(cfg) => assert_eq!(cfg.pages.len(), 1),
            other => panic!("expected local config, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_local_missing_is_error() {
        let reconciler = ConfigReconciler::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            reconciler.load().await,
            Err(ConfigError::Missing(k)) if k == keys::LOCAL_CONFIG
        ));
    }

    #[tokio::test]
    async fn test_load_remote_without_cache() {
        let store = Arc::new(MemoryStore::new());
        set_typed(store.as_ref(), keys::USE_REMOTE_CONFIG, &true)
            .await
            .unwrap();
        set_typed(
            store.as_ref(),
            keys::REMOTE_SETTINGS,
            &RemoteSettings {
                config_url: "https://cfg.example/config.json".into(),
                config_reload_interval_minutes: 5,
            },
        )
        .await
        .unwrap();

        let reconciler = ConfigReconciler::new(store);
        match reconciler.load().await.unwrap() {
            EffectiveConfig::Remote { cached, settings } => {
                assert!(cached.is_none());
                assert_eq!(settings.config_reload_interval_minutes, 5);
            }
            other => panic!("expected remote config, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_remote_missing_settings_is_error() {
        let store = Arc::new(MemoryStore::new());
        set_typed(store.as_ref(), keys::USE_REMOTE_CONFIG, &true)
            .await
            .unwrap();

        let reconciler = ConfigReconciler::new(store);
        assert!(matches!(
            reconciler.load().await,
            Err(ConfigError::Missing(k)) if k == keys::REMOTE_SETTINGS
        ));
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_url() {
        let reconciler = ConfigReconciler::new(Arc::new(MemoryStore::new()));
        let settings = RemoteSettings {
            config_url: "not a url".into(),
            config_reload_interval_minutes: 0,
        };
        assert!(matches!(
            reconciler.fetch(&settings).await,
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_cache_remote_round_trips() {
        let store = Arc::new(MemoryStore::new());
        let reconciler = ConfigReconciler::new(store.clone());
        let cfg = config(&["https://a.example", "https://b.example"]);

        reconciler.cache_remote(&cfg).await.unwrap();
        let cached: Option<RotationConfig> =
            get_typed(store.as_ref(), keys::REMOTE_CONFIG).await.unwrap();
        assert_eq!(cached, Some(cfg));
    }
}
