//! Per-page rotation slot
//!
//! A slot tracks one or two underlying resources for a single page: the
//! `primary` currently on display, and an optional `shadow` loading a fresh
//! copy off-screen that the scheduler swaps in once ready. The slot also
//! carries the retry/skip bookkeeping of the per-page state machine.

use std::time::Duration;

use super::timer::TimerGuard;
use crate::controller::ResourceId;
use crate::models::{PageSpec, FAILED_PAGE_RELOAD_SECS};

/// Which of a slot's handles an event referred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Primary,
    Shadow,
}

/// Mutable per-page rotation unit, owned exclusively by the scheduler.
#[derive(Debug)]
pub struct Slot {
    /// Immutable page configuration this slot displays.
    pub page: PageSpec,

    /// Currently displayed resource.
    pub primary: Option<ResourceId>,

    /// Pending replacement resource, loading off-screen.
    pub shadow: Option<ResourceId>,

    pub primary_ready: bool,
    pub shadow_ready: bool,

    /// Consecutive load failures on the current handle.
    pub retry_count: u32,

    /// Retries exhausted; the slot is passed over during rotation until a
    /// load completes again.
    pub skip: bool,

    /// Initial load signal observed (used by the build fan-out/join).
    pub settled: bool,

    /// Outstanding reload/retry timer, if any.
    pub reload_timer: Option<TimerGuard>,
}

impl Slot {
    pub fn new(page: PageSpec) -> Self {
        Self {
            page,
            primary: None,
            shadow: None,
            primary_ready: false,
            shadow_ready: false,
            retry_count: 0,
            skip: false,
            settled: false,
            reload_timer: None,
        }
    }

    /// Whether the rotation loop may display this slot right now.
    pub fn displayable(&self) -> bool {
        !self.skip && (self.primary_ready || self.shadow_ready)
    }

    /// Classify `id` against this slot's handles. The shadow is checked
    /// first: during a swap the same id briefly moves from shadow to
    /// primary and events for the in-flight copy must win.
    pub fn kind_of(&self, id: ResourceId) -> Option<HandleKind> {
        if self.shadow == Some(id) {
            Some(HandleKind::Shadow)
        } else if self.primary == Some(id) {
            Some(HandleKind::Primary)
        } else {
            None
        }
    }

    pub fn owns(&self, id: ResourceId) -> bool {
        self.kind_of(id).is_some()
    }

    /// Drop the outstanding reload/retry timer and reset the retry budget.
    pub fn clear_reload_timer(&mut self) {
        self.retry_count = 0;
        self.reload_timer = None;
    }

    /// Probe interval for a degraded page: the page's own reload interval
    /// capped at the failed-page default, or the flat default when the page
    /// never auto-reloads.
    pub fn recovery_delay(&self) -> Duration {
        let default = FAILED_PAGE_RELOAD_SECS;
        let secs = if self.page.reload_interval_seconds > 0 {
            (self.page.reload_interval_seconds as u64).min(default)
        } else {
            default
        };
        Duration::from_secs(secs)
    }
}
