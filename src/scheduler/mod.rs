//! Rotation scheduling
//!
//! The scheduler cycles through a set of configured pages on per-page
//! timers, showing each page only once it has finished loading. It retries
//! failed loads, degrades broken pages out of the rotation with periodic
//! recovery probes, refreshes pages invisibly through off-screen shadow
//! resources, and reconciles against remotely served configuration.
//!
//! All of this runs on a single engine task spawned by
//! [`RotationScheduler::spawn`]; callers hold a cloneable
//! [`SchedulerHandle`] and communicate over channels.

mod command;
pub mod engine;
mod slot;
mod timer;

pub use command::SchedulerHandle;
pub use engine::RotationScheduler;
pub use slot::{HandleKind, Slot};
pub use timer::TimerGuard;
