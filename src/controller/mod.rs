//! Resource controller abstraction
//!
//! The mechanism that actually renders a page (a browser tab, a webview, a
//! simulated window) sits behind the [`ResourceController`] trait. The
//! scheduler issues create/activate/reload/remove requests and consumes the
//! controller's unsolicited load/error/removal events from an mpsc stream;
//! event ordering relative to timer firings is arbitrary and the scheduler
//! must treat it as such.

pub mod sim;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use sim::{SimAction, SimulatedController};

/// Result type for controller operations
pub type ControllerResult<T> = Result<T, ControllerError>;

/// Errors reported by a resource controller.
///
/// Controller failures are never fatal to the scheduler; they are logged
/// and the affected slot stays in its prior state.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The host refused to create a resource
    #[error("failed to create resource for '{url}': {reason}")]
    CreateFailed { url: String, reason: String },

    /// An operation referenced a handle the host no longer knows
    #[error("unknown resource {0}")]
    UnknownResource(ResourceId),

    /// The host rejected an activate/reload/remove call
    #[error("operation '{operation}' failed on resource {id}: {reason}")]
    OperationFailed {
        operation: &'static str,
        id: ResourceId,
        reason: String,
    },

    /// Generic controller error
    #[error("controller error: {0}")]
    Other(String),
}

impl ControllerError {
    pub fn operation_failed(
        operation: &'static str,
        id: ResourceId,
        reason: impl Into<String>,
    ) -> Self {
        Self::OperationFailed {
            operation,
            id,
            reason: reason.into(),
        }
    }
}

/// Opaque identifier of a display resource issued by the controller.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unsolicited events emitted by a resource controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    /// A resource finished loading the given URL
    LoadComplete { id: ResourceId, url: String },

    /// A resource failed to load the given URL
    LoadError { id: ResourceId, url: String },

    /// A resource disappeared out-of-band (e.g. closed by the viewer)
    Removed { id: ResourceId },
}

impl ResourceEvent {
    /// Id of the resource the event concerns.
    pub fn resource_id(&self) -> ResourceId {
        match self {
            Self::LoadComplete { id, .. } | Self::LoadError { id, .. } | Self::Removed { id } => {
                *id
            }
        }
    }
}

/// Host interface for creating and driving display resources.
///
/// Every operation is asynchronous and best-effort. Each handle belongs to
/// exactly one slot; the scheduler never shares a handle for mutation.
#[async_trait]
pub trait ResourceController: Send + Sync {
    /// Create a new resource loading `url`. `active` controls whether it is
    /// displayed immediately or loads off-screen.
    async fn create(&self, url: &str, active: bool) -> ControllerResult<ResourceId>;

    /// Bring an existing resource to the foreground.
    async fn activate(&self, id: ResourceId) -> ControllerResult<()>;

    /// Reload a resource at its current URL.
    async fn reload(&self, id: ResourceId) -> ControllerResult<()>;

    /// Destroy a resource.
    async fn remove(&self, id: ResourceId) -> ControllerResult<()>;

    /// Switch the display into fullscreen mode. Hosts without a window
    /// concept keep the default no-op.
    async fn enter_fullscreen(&self) -> ControllerResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_id_display_and_serde() {
        let id = ResourceId(42);
        assert_eq!(id.to_string(), "#42");

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let back: ResourceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_event_resource_id() {
        let ev = ResourceEvent::LoadError {
            id: ResourceId(7),
            url: "https://a.example".into(),
        };
        assert_eq!(ev.resource_id(), ResourceId(7));

        let ev = ResourceEvent::Removed { id: ResourceId(9) };
        assert_eq!(ev.resource_id(), ResourceId(9));
    }

    #[test]
    fn test_controller_error_display() {
        let err = ControllerError::operation_failed("reload", ResourceId(3), "gone");
        assert!(err.to_string().contains("reload"));
        assert!(err.to_string().contains("#3"));
    }
}
