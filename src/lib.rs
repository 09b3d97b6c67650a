//! Carousel - unattended page rotation for always-on displays
//!
//! Carousel drives a wall display (kiosk, dashboard screen, signage) through
//! a configured list of pages. It creates one display resource per page via
//! a pluggable [`controller::ResourceController`], shows each page for its
//! configured dwell time, and keeps the rotation healthy without operator
//! intervention:
//!
//! - pages are shown only after their load completed, never mid-load
//! - failed loads are retried, then degraded out of the rotation with a
//!   periodic recovery probe until they come back
//! - periodic page refreshes load off-screen and are hot swapped in, so the
//!   viewer never sees a reload
//! - configuration can be local or fetched from a remote endpoint and
//!   re-polled on an interval
//! - rotation state is persisted, so a crashed process cleans up its
//!   leftover resources and resumes on restart
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use carousel::controller::SimulatedController;
//! use carousel::models::{keys, PageSpec, RotationConfig};
//! use carousel::scheduler::RotationScheduler;
//! use carousel::store::{self, MemoryStore};
//!
//! # async fn run() -> carousel::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let config = RotationConfig::new(vec![PageSpec::new("https://status.example", 20, 0)]);
//! store::set_typed(store.as_ref(), keys::USE_REMOTE_CONFIG, &false).await?;
//! store::set_typed(store.as_ref(), keys::LOCAL_CONFIG, &config).await?;
//!
//! let (controller, events) = SimulatedController::new();
//! let scheduler = RotationScheduler::spawn(controller, store, events);
//! scheduler.start().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod store;

pub use error::{Error, ErrorCategory, Result};

/// Commonly used types
pub mod prelude {
    pub use crate::config::{ConfigReconciler, EffectiveConfig};
    pub use crate::controller::{ResourceController, ResourceEvent, ResourceId};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{PageSpec, RemoteSettings, RotationConfig, RotationState};
    pub use crate::scheduler::{RotationScheduler, SchedulerHandle};
    pub use crate::store::{JsonFileStore, MemoryStore, StateStore};
}
