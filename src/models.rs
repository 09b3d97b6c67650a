//! Core value types for the rotation scheduler
//!
//! Configurations are replaced wholesale on change, never mutated
//! field-by-field, so every type here derives [`PartialEq`] and change
//! detection is plain structural equality.
//!
//! Serde field names stay camelCase to match the persisted JSON layout
//! that settings editors and remote configuration endpoints produce.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::controller::ResourceId;

/// Minimum allowed active-display duration for a page.
pub const MIN_DELAY_SECS: i64 = 3;

/// Consecutive load failures tolerated on a handle before the slot degrades.
pub const MAX_RETRIES: u32 = 1;

/// Recovery probe interval for a degraded page, in seconds.
pub const FAILED_PAGE_RELOAD_SECS: u64 = 120;

/// Back-off applied when a full rotation lap finds no displayable slot.
pub const ALL_PAGES_FAILED_WAIT_SECS: u64 = 120;

// ============================================================================
// Storage keys
// ============================================================================

/// Keys of the persisted layout in the state store.
pub mod keys {
    pub const USE_REMOTE_CONFIG: &str = "useRemoteConfig";
    pub const LOCAL_CONFIG: &str = "localConfig";
    pub const REMOTE_SETTINGS: &str = "remoteSettings";
    pub const REMOTE_CONFIG: &str = "remoteConfig";
    pub const ROTATION_STATE: &str = "rotationState";
}

// ============================================================================
// Page and rotation configuration
// ============================================================================

/// Immutable per-page configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpec {
    /// Link to the page to display. Remote (`https://`) or local (`file://`).
    pub url: String,

    /// Time in seconds the page stays on display.
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: i64,

    /// Page reload interval in seconds. 0 means the page never auto-reloads.
    #[serde(default)]
    pub reload_interval_seconds: i64,
}

fn default_delay_seconds() -> i64 {
    20
}

impl PageSpec {
    pub fn new(url: impl Into<String>, delay_seconds: i64, reload_interval_seconds: i64) -> Self {
        Self {
            url: url.into(),
            delay_seconds,
            reload_interval_seconds,
        }
    }

    /// Active-display duration, clamped to a non-negative range.
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds.max(0) as u64)
    }

    /// Auto-reload interval, or `None` when auto-reload is disabled.
    pub fn reload_interval(&self) -> Option<Duration> {
        if self.reload_interval_seconds > 0 {
            Some(Duration::from_secs(self.reload_interval_seconds as u64))
        } else {
            None
        }
    }

    fn collect_errors(&self, index: usize, errors: &mut Vec<String>) {
        if self.url.trim().is_empty() {
            errors.push(format!("pages[{index}].url must be a non-empty string."));
        }
        if self.delay_seconds < MIN_DELAY_SECS {
            errors.push(format!(
                "pages[{index}].delaySeconds must be equal or greater than {MIN_DELAY_SECS}."
            ));
        }
        if self.reload_interval_seconds < 0 {
            errors.push(format!(
                "pages[{index}].reloadIntervalSeconds must be equal or greater than 0."
            ));
        }
    }
}

/// Ordered set of pages to rotate through. Order is rotation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationConfig {
    pub pages: Vec<PageSpec>,

    /// Whether the display should be switched to fullscreen on start.
    #[serde(default = "default_fullscreen")]
    pub is_fullscreen: bool,
}

fn default_fullscreen() -> bool {
    true
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            is_fullscreen: true,
        }
    }
}

impl RotationConfig {
    /// Configuration with the given pages and fullscreen enabled.
    pub fn new(pages: Vec<PageSpec>) -> Self {
        Self {
            pages,
            is_fullscreen: true,
        }
    }

    /// Validate every page, aggregating all field errors into one failure
    /// instead of failing fast on the first.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();
        for (index, page) in self.pages.iter().enumerate() {
            page.collect_errors(index, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { errors })
        }
    }
}

/// Aggregated configuration validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub errors: Vec<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed: {}", self.errors.join(" "))
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// Remote settings
// ============================================================================

/// Settings controlling remote configuration fetch and polling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSettings {
    /// URL to fetch the configuration from. Empty disables fetching.
    #[serde(default)]
    pub config_url: String,

    /// Interval in minutes for re-fetching the configuration.
    /// 0 means fetch once on start, no polling.
    #[serde(default)]
    pub config_reload_interval_minutes: i64,
}

impl RemoteSettings {
    /// Whether a fetch should happen at all.
    pub fn fetch_enabled(&self) -> bool {
        !self.config_url.trim().is_empty()
    }

    /// Recurring poll period, or `None` when polling is disabled.
    pub fn poll_interval(&self) -> Option<Duration> {
        if self.fetch_enabled() && self.config_reload_interval_minutes > 0 {
            Some(Duration::from_secs(
                self.config_reload_interval_minutes as u64 * 60,
            ))
        } else {
            None
        }
    }
}

// ============================================================================
// Persisted rotation state
// ============================================================================

/// The only state surviving a process restart. Lets a fresh scheduler
/// detect and dispose resources orphaned by a prior run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationState {
    pub is_rotating: bool,

    /// Resources currently owned by the rotation, in creation order.
    #[serde(default)]
    pub resource_ids: Vec<ResourceId>,
}

impl RotationState {
    pub fn contains(&self, id: ResourceId) -> bool {
        self.resource_ids.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str) -> PageSpec {
        PageSpec::new(url, 10, 0)
    }

    #[test]
    fn test_validate_ok() {
        let config = RotationConfig {
            pages: vec![page("https://a.example"), page("file:///b.html")],
            is_fullscreen: true,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_aggregates_all_errors() {
        let config = RotationConfig {
            pages: vec![
                PageSpec::new("", 1, -5),
                page("https://ok.example"),
                PageSpec::new("   ", 3, 0),
            ],
            is_fullscreen: false,
        };

        let err = config.validate().unwrap_err();
        assert_eq!(err.errors.len(), 4);
        assert!(err.errors[0].contains("pages[0].url"));
        assert!(err.errors[1].contains("pages[0].delaySeconds"));
        assert!(err.errors[2].contains("pages[0].reloadIntervalSeconds"));
        assert!(err.errors[3].contains("pages[2].url"));
        assert!(err.to_string().starts_with("Validation failed:"));
    }

    #[test]
    fn test_empty_config_is_valid_but_unusable() {
        // Emptiness is a scheduler-level terminal condition, not a field error.
        assert!(RotationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_structural_equality() {
        let a = RotationConfig {
            pages: vec![page("https://a.example")],
            is_fullscreen: true,
        };
        let b = a.clone();
        assert_eq!(a, b);

        let mut c = a.clone();
        c.pages[0].delay_seconds = 11;
        assert_ne!(a, c);

        // Order is significant.
        let d = RotationConfig {
            pages: vec![page("https://b.example"), page("https://a.example")],
            is_fullscreen: true,
        };
        let e = RotationConfig {
            pages: vec![page("https://a.example"), page("https://b.example")],
            is_fullscreen: true,
        };
        assert_ne!(d, e);
    }

    #[test]
    fn test_serde_camel_case_layout() {
        let json = serde_json::json!({
            "pages": [
                { "url": "https://a.example", "delaySeconds": 5, "reloadIntervalSeconds": 30 }
            ],
            "isFullscreen": false
        });
        let config: RotationConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.pages[0].delay_seconds, 5);
        assert_eq!(config.pages[0].reload_interval_seconds, 30);
        assert!(!config.is_fullscreen);

        let back = serde_json::to_value(&config).unwrap();
        assert!(back.get("isFullscreen").is_some());
        assert!(back["pages"][0].get("delaySeconds").is_some());
    }

    #[test]
    fn test_page_defaults() {
        let page: PageSpec =
            serde_json::from_value(serde_json::json!({ "url": "https://a.example" })).unwrap();
        assert_eq!(page.delay_seconds, 20);
        assert_eq!(page.reload_interval_seconds, 0);
        assert_eq!(page.reload_interval(), None);
    }

    #[test]
    fn test_remote_settings_poll_interval() {
        let disabled = RemoteSettings::default();
        assert!(!disabled.fetch_enabled());
        assert_eq!(disabled.poll_interval(), None);

        let fetch_once = RemoteSettings {
            config_url: "https://cfg.example/config.json".into(),
            config_reload_interval_minutes: 0,
        };
        assert!(fetch_once.fetch_enabled());
        assert_eq!(fetch_once.poll_interval(), None);

        let polling = RemoteSettings {
            config_url: "https://cfg.example/config.json".into(),
            config_reload_interval_minutes: 2,
        };
        assert_eq!(polling.poll_interval(), Some(Duration::from_secs(120)));
    }
}
