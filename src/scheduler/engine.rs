//! Rotation scheduler engine
//!
//! A single actor task owns every piece of mutable rotation state: the slot
//! set, the rotation index, and all timers. Concurrency comes only from the
//! asynchrony of collaborators: controller events, timer firings and
//! commands interleave in arbitrary order on the engine's queues and are
//! applied one at a time, so no slot field is ever touched from two places
//! at once.
//!
//! The rotation loop is readiness-gated: a slot is only displayed when one
//! of its resources has finished loading, so a slow or broken page is never
//! shown mid-load. Page refreshes happen through shadow resources that load
//! off-screen and are swapped in atomically once ready.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::command::{Command, SchedulerHandle};
use super::slot::{HandleKind, Slot};
use super::timer::TimerGuard;
use crate::config::{ConfigError, ConfigReconciler, EffectiveConfig};
use crate::controller::{ResourceController, ResourceEvent, ResourceId};
use crate::error::{Error, Result};
use crate::models::{
    keys, RemoteSettings, RotationConfig, RotationState, ALL_PAGES_FAILED_WAIT_SECS, MAX_RETRIES,
};
use crate::store::{RotationStateStore, StateStore};

/// Messages the engine sends itself from timer tasks.
#[derive(Debug)]
enum Internal {
    /// The rotation tick elapsed
    RotateTick { token: u64 },

    /// A slot's reload/retry timer elapsed
    SlotTimer { slot: usize, token: u64 },

    /// The remote configuration poll interval elapsed
    ConfigPoll { token: u64 },
}

/// Action decided while inspecting a slot, executed after the borrow ends.
enum SlotTimerAction {
    Reload(ResourceId),
    CreateShadow(String),
    CreatePrimary(String),
    Nothing,
}

/// The rotation scheduler engine.
///
/// Constructed and detached through [`RotationScheduler::spawn`]; all
/// interaction goes through the returned [`SchedulerHandle`]. The engine
/// exits when every handle has been dropped.
pub struct RotationScheduler {
    controller: Arc<dyn ResourceController>,
    reconciler: ConfigReconciler,
    state_store: RotationStateStore,

    commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedReceiver<ResourceEvent>,
    events_closed: bool,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,

    state: RotationState,
    slots: Vec<Slot>,
    current_index: usize,
    last_applied: Option<RotationConfig>,
    poll_settings: Option<RemoteSettings>,

    rotation_timer: Option<TimerGuard>,
    poll_timer: Option<TimerGuard>,
    timer_seq: u64,
}

// TEMP DIAG (remove before finish)
pub static DIAG: std::sync::Mutex<Vec<String>> = std::sync::Mutex::new(Vec::new());
macro_rules! diag {
    ($($arg:tt)*) => {
        DIAG.lock().unwrap().push(format!("t={:?} {}", tokio::time::Instant::now(), format!($($arg)*)))
    };
}

impl RotationScheduler {
    /// Spawn the engine over a controller, a state store and the
    /// controller's event stream. Performs crash recovery before serving:
    /// resources persisted by a previous run are removed, and rotation is
    /// resumed when the previous run was rotating.
    pub fn spawn(
        controller: Arc<dyn ResourceController>,
        store: Arc<dyn StateStore>,
        events: mpsc::UnboundedReceiver<ResourceEvent>,
    ) -> SchedulerHandle {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();

        let engine = Self {
            controller,
            reconciler: ConfigReconciler::new(Arc::clone(&store)),
            state_store: RotationStateStore::new(store),
            commands: command_rx,
            events,
            events_closed: false,
            internal_tx,
            internal_rx,
            state: RotationState::default(),
            slots: Vec::new(),
            current_index: 0,
            last_applied: None,
            poll_settings: None,
            rotation_timer: None,
            poll_timer: None,
            timer_seq: 0,
        };
        tokio::spawn(engine.run());

        SchedulerHandle::new(command_tx)
    }

    async fn run(mut self) {
        self.recover().await;

        loop {
            diag!("loop top");
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => { diag!("cmd"); self.handle_command(cmd).await },
                    None => break,
                },
                Some(msg) = self.internal_rx.recv() => { diag!("internal {:?}", msg); self.handle_internal(msg).await },
                event = self.events.recv(), if !self.events_closed => match event {
                    Some(event) => self.handle_event(event).await,
                    None => self.events_closed = true,
                },
            }
        }
        debug!("scheduler engine shutting down");
    }

    // ------------------------------------------------------------------
    // Crash recovery
    // ------------------------------------------------------------------

    /// Restore the previous run's persisted state: dispose orphaned
    /// resources, then resume rotation if the previous run was rotating.
    async fn recover(&mut self) {
        let previous = match self.state_store.load().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "failed to restore previous rotation state");
                return;
            }
        };

        if !previous.resource_ids.is_empty() {
            info!(
                count = previous.resource_ids.len(),
                "removing resources left over from a previous run"
            );
            for id in &previous.resource_ids {
                if let Err(e) = self.controller.remove(*id).await {
                    warn!(%id, error = %e, "failed to remove orphaned resource");
                }
            }
        }

        self.state = RotationState::default();
        if let Err(e) = self.state_store.save(&self.state).await {
            warn!(error = %e, "failed to persist cleaned rotation state");
        }

        if previous.is_rotating {
            info!("previous run was rotating; resuming");
            if let Err(e) = self.start_with_rollback().await {
                warn!(error = %e, "failed to resume rotation after restart");
            }
        }
    }

    // ------------------------------------------------------------------
    // Command handling
    // ------------------------------------------------------------------

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start { reply } => {
                let result = self.start_with_rollback().await;
                let _ = reply.send(result);
            }
            Command::Stop { reply } => {
                let _ = reply.send(self.stop_internal().await);
            }
            Command::QueryState { reply } => {
                let _ = reply.send(self.state.is_rotating);
            }
            Command::ConfigChanged | Command::SettingsChanged => {
                self.handle_config_notification().await;
            }
        }
    }

    async fn start_with_rollback(&mut self) -> Result<()> {
        match self.start().await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(error = %e, "start failed; rolling back");
                if let Err(cleanup) = self.stop_internal().await {
                    warn!(error = %cleanup, "cleanup after failed start also failed");
                }
                Err(e)
            }
        }
    }

    /// Start (or restart) rotation. A running rotation is stopped first and
    /// its resources released before anything new is created, so two
    /// lifecycles can never overlap.
    async fn start(&mut self) -> Result<()> {
        info!("starting rotation");
        self.poll_timer = None;
        self.poll_settings = None;

        if self.state.is_rotating {
            self.stop_internal().await?;
        }
        self.set_rotation_state(true, None).await?;

        match self.reconciler.load().await? {
            EffectiveConfig::Local(config) => {
                self.apply_config(config).await?;
            }
            EffectiveConfig::Remote { cached, settings } => {
                if settings.fetch_enabled() {
                    // Initial reconciliation failures propagate to the caller;
                    // only background polls swallow them.
                    let fresh = self.reconciler.fetch(&settings).await?;
                    if cached.as_ref() != Some(&fresh) {
                        self.reconciler.cache_remote(&fresh).await?;
                    }
                    self.apply_config(fresh).await?;
                    if let Some(interval) = settings.poll_interval() {
                        self.arm_poll_timer(interval);
                        self.poll_settings = Some(settings);
                    }
                } else {
                    let config = cached
                        .ok_or(ConfigError::Missing(keys::REMOTE_CONFIG))
                        .map_err(Error::from)?;
                    self.apply_config(config).await?;
                }
            }
        }
        Ok(())
    }

    /// Stop rotation: cancel every timer, release every resource, persist
    /// the stopped state. Removal failures are logged, never retried.
    async fn stop_internal(&mut self) -> Result<()> {
        debug!("stopping rotation");
        self.rotation_timer = None;
        self.poll_timer = None;
        self.poll_settings = None;
        self.teardown_slots().await;
        self.last_applied = None;
        self.set_rotation_state(false, Some(Vec::new())).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Configuration reconciliation
    // ------------------------------------------------------------------

    /// React to a configuration/settings change notification. Rotation is
    /// only rebuilt when the effective configuration materially changed.
    async fn handle_config_notification(&mut self) {
        if !self.state.is_rotating {
            debug!("configuration changed while stopped; nothing to do");
            return;
        }

        match self.reconciler.load().await {
            Ok(EffectiveConfig::Local(config)) => {
                self.poll_timer = None;
                self.poll_settings = None;
                if let Err(e) = self.apply_config(config).await {
                    warn!(error = %e, "failed to apply changed local configuration");
                }
            }
            Ok(EffectiveConfig::Remote { cached, settings }) => {
                self.poll_timer = None;
                self.poll_settings = None;
                if settings.fetch_enabled() {
                    self.poll_settings = Some(settings);
                    self.poll_remote().await;
                } else if let Some(config) = cached {
                    if let Err(e) = self.apply_config(config).await {
                        warn!(error = %e, "failed to apply cached remote configuration");
                    }
                } else {
                    warn!("remote configuration selected but no cached copy is available");
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to reload configuration after change notification");
            }
        }
    }

    /// One remote reconciliation cycle: fetch, compare, maybe rebuild,
    /// re-arm the poll. Failures leave the running configuration untouched.
    async fn poll_remote(&mut self) {
        let Some(settings) = self.poll_settings.clone() else {
            return;
        };
        if !self.state.is_rotating {
            return;
        }

        match self.reconciler.fetch(&settings).await {
            Ok(fresh) => {
                if self.last_applied.as_ref() == Some(&fresh) {
                    debug!("remote configuration unchanged");
                } else {
                    info!("remote configuration changed; rebuilding rotation");
                    if let Err(e) = self.reconciler.cache_remote(&fresh).await {
                        warn!(error = %e, "failed to cache remote configuration");
                    }
                    if let Err(e) = self.apply_config(fresh).await {
                        warn!(error = %e, "failed to apply remote configuration");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "remote configuration poll failed; keeping current configuration");
            }
        }

        if let Some(interval) = settings.poll_interval() {
            self.arm_poll_timer(interval);
        }
    }

    /// Replace the active slot set with one built from `config`, unless the
    /// configuration is structurally identical to the one already applied.
    async fn apply_config(&mut self, config: RotationConfig) -> Result<()> {
        if self.last_applied.as_ref() == Some(&config) && !self.slots.is_empty() {
            debug!("configuration unchanged; keeping current slots");
            return Ok(());
        }
        if config.pages.is_empty() {
            return Err(Error::scheduler("configuration contains no pages"));
        }

        self.teardown_slots().await;
        self.build_slots(&config).await?;

        if config.is_fullscreen {
            if let Err(e) = self.controller.enter_fullscreen().await {
                warn!(error = %e, "fullscreen request failed");
            }
        }

        self.last_applied = Some(config);
        self.current_index = 0;
        self.rotate().await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Slot construction and teardown
    // ------------------------------------------------------------------

    /// Create one slot per page. Resource creation fans out concurrently
    /// (only index 0 is created active); rotation does not begin until every
    /// slot's initial load attempt has settled with success or error.
    async fn build_slots(&mut self, config: &RotationConfig) -> Result<()> {
        debug!(pages = config.pages.len(), "building slots");

        let creations = config.pages.iter().enumerate().map(|(index, page)| {
            let controller = Arc::clone(&self.controller);
            let url = page.url.clone();
            async move { controller.create(&url, index == 0).await }
        });
        let created = futures::future::join_all(creations).await;

        let mut slots = Vec::with_capacity(config.pages.len());
        let mut ids = Vec::new();
        for (page, result) in config.pages.iter().zip(created) {
            let mut slot = Slot::new(page.clone());
            match result {
                Ok(id) => {
                    slot.primary = Some(id);
                    ids.push(id);
                }
                Err(e) => {
                    warn!(url = %page.url, error = %e, "resource creation failed");
                    // Nothing will ever signal this slot; don't wait for it.
                    slot.settled = true;
                }
            }
            slots.push(slot);
        }

        self.slots = slots;
        self.set_rotation_state(true, Some(ids)).await?;
        self.await_initial_loads().await;
        Ok(())
    }

    /// Fan-in: process controller events (and timer messages) until every
    /// slot observed its first load signal.
    async fn await_initial_loads(&mut self) {
        while self.slots.iter().any(|slot| !slot.settled) {
            if self.events_closed {
                warn!("event stream closed before all pages settled");
                break;
            }
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => self.events_closed = true,
                },
                Some(msg) = self.internal_rx.recv() => match msg {
                    Internal::SlotTimer { slot, token } => self.on_slot_timer(slot, token).await,
                    // No rotation or poll timer can be armed while slots build.
                    other => debug!(?other, "timer message during slot build ignored"),
                },
            }
        }
        debug!("all initial page loads settled");
    }

    /// Cancel every slot timer and release every tracked resource.
    async fn teardown_slots(&mut self) {
        self.rotation_timer = None;
        for slot in &mut self.slots {
            slot.reload_timer = None;
        }
        self.slots.clear();
        self.current_index = 0;

        let ids = std::mem::take(&mut self.state.resource_ids);
        for id in ids {
            if let Err(e) = self.controller.remove(id).await {
                warn!(%id, error = %e, "failed to remove resource");
            }
        }
        self.save_state().await;
    }

    // ------------------------------------------------------------------
    // The rotation loop
    // ------------------------------------------------------------------

    /// One rotation step: find the next displayable slot, show it, schedule
    /// the next tick. Slots that are not ready are skipped synchronously;
    /// a full lap with nothing ready backs off before trying again.
    async fn rotate(&mut self) {
        if !self.state.is_rotating {
            debug!("rotation inactive; tick ignored");
            return;
        }
        if self.slots.is_empty() {
            error!("no pages configured; stopping rotation");
            if let Err(e) = self.stop_internal().await {
                warn!(error = %e, "stop after empty configuration failed");
            }
            return;
        }

        let len = self.slots.len();
        let mut inspected = 0;
        while inspected < len && !self.slots[self.current_index].displayable() {
            self.current_index = (self.current_index + 1) % len;
            inspected += 1;
        }
        if inspected == len {
            warn!(
                wait_secs = ALL_PAGES_FAILED_WAIT_SECS,
                "no page ready for display; waiting until the next check"
            );
            self.arm_rotation_timer(Duration::from_secs(ALL_PAGES_FAILED_WAIT_SECS));
            return;
        }

        let index = self.current_index;
        let delay = self.slots[index].page.delay();
        let swap = self.slots[index].shadow_ready && self.slots[index].shadow.is_some();
        if swap {
            self.hot_swap(index).await;
        } else if let Some(primary) = self.slots[index].primary {
            debug!(slot = index, %primary, "activating resource");
            if let Err(e) = self.controller.activate(primary).await {
                warn!(%primary, error = %e, "failed to activate resource");
            }
        }

        self.current_index = (self.current_index + 1) % len;
        self.arm_rotation_timer(delay);
    }

    /// Swap a freshly loaded shadow in for the displayed primary. The old
    /// primary is removed only after the shadow is activated, so the viewer
    /// never sees a blank or reloading page.
    async fn hot_swap(&mut self, index: usize) {
        let (shadow, old) = {
            let slot = &mut self.slots[index];
            let Some(shadow) = slot.shadow.take() else {
                return;
            };
            let old = slot.primary.replace(shadow);
            slot.primary_ready = true;
            slot.shadow_ready = false;
            (shadow, old)
        };

        info!(slot = index, new = %shadow, "hot swapping to freshly loaded resource");
        if let Err(e) = self.controller.activate(shadow).await {
            warn!(%shadow, error = %e, "failed to activate replacement resource");
        }
        if let Some(old) = old {
            if let Err(e) = self.controller.remove(old).await {
                warn!(%old, error = %e, "failed to remove replaced resource");
            }
            self.state.resource_ids.retain(|id| *id != old);
            self.save_state().await;
        }
    }

    // ------------------------------------------------------------------
    // Controller events (slot lifecycle)
    // ------------------------------------------------------------------

    async fn handle_event(&mut self, event: ResourceEvent) {
        match event {
            ResourceEvent::LoadComplete { id, url } => self.on_load_complete(id, &url).await,
            ResourceEvent::LoadError { id, url } => self.on_load_error(id, &url).await,
            ResourceEvent::Removed { id } => self.on_removed(id).await,
        }
    }

    /// A resource finished loading: mark it ready and arm the page's
    /// auto-reload timer if it has one.
    async fn on_load_complete(&mut self, id: ResourceId, url: &str) {
        let Some(index) = self.find_slot(id) else {
            debug!(%id, "load completion for untracked resource ignored");
            return;
        };

        let token = self.next_token();
        let internal_tx = self.internal_tx.clone();
        let slot = &mut self.slots[index];
        if slot.page.url != url {
            debug!(%id, url, "stale load completion ignored");
            return;
        }

        slot.settled = true;
        match slot.kind_of(id) {
            Some(HandleKind::Shadow) => slot.shadow_ready = true,
            Some(HandleKind::Primary) => slot.primary_ready = true,
            None => return,
        }
        slot.skip = false;
        slot.clear_reload_timer();

        debug!(slot = index, %id, "page loaded");
        if let Some(interval) = slot.page.reload_interval() {
            debug!(slot = index, secs = interval.as_secs(), "arming reload timer");
            slot.reload_timer = Some(TimerGuard::spawn(
                token,
                interval,
                internal_tx,
                Internal::SlotTimer { slot: index, token },
            ));
        }
    }

    /// A resource failed to load: retry in place within the budget, then
    /// degrade the slot to skip with a periodic recovery probe.
    async fn on_load_error(&mut self, id: ResourceId, url: &str) {
        let Some(index) = self.find_slot(id) else {
            debug!(%id, "load error for untracked resource ignored");
            return;
        };

        let token = self.next_token();
        let internal_tx = self.internal_tx.clone();
        let retry = {
            let slot = &mut self.slots[index];
            if slot.page.url != url {
                debug!(%id, url, "stale load error ignored");
                return;
            }
            slot.settled = true;

            if slot.retry_count < MAX_RETRIES {
                slot.retry_count += 1;
                true
            } else {
                match slot.kind_of(id) {
                    Some(HandleKind::Shadow) => slot.shadow_ready = false,
                    Some(HandleKind::Primary) => slot.primary_ready = false,
                    None => return,
                }
                if !slot.primary_ready && !slot.shadow_ready {
                    slot.skip = true;
                }
                slot.clear_reload_timer();
                let delay = slot.recovery_delay();
                slot.reload_timer = Some(TimerGuard::spawn(
                    token,
                    delay,
                    internal_tx,
                    Internal::SlotTimer { slot: index, token },
                ));
                info!(
                    slot = index,
                    %id,
                    probe_secs = delay.as_secs(),
                    "page degraded after repeated load errors"
                );
                false
            }
        };

        if retry {
            info!(slot = index, %id, url, "retrying failed page load");
            if let Err(e) = self.controller.reload(id).await {
                warn!(%id, error = %e, "retry reload failed");
            }
        }
    }

    /// A resource disappeared out-of-band. The slot stays in the rotation;
    /// its reload timer recreates the resource when one is configured.
    async fn on_removed(&mut self, id: ResourceId) {
        let Some(index) = self.find_slot(id) else {
            return;
        };

        let slot = &mut self.slots[index];
        match slot.kind_of(id) {
            Some(HandleKind::Shadow) => {
                slot.shadow = None;
                slot.shadow_ready = false;
            }
            Some(HandleKind::Primary) => {
                slot.primary = None;
                slot.primary_ready = false;
            }
            None => return,
        }
        // The slot stays; an armed reload timer will recreate the resource.
        info!(slot = index, %id, "resource removed externally");

        self.state.resource_ids.retain(|r| *r != id);
        self.save_state().await;
    }

    /// A slot's reload/retry timer elapsed.
    async fn on_slot_timer(&mut self, index: usize, token: u64) {
        if index >= self.slots.len() {
            return;
        }
        let current = match &self.slots[index].reload_timer {
            Some(timer) if timer.matches(token) => true,
            _ => false,
        };
        if !current {
            debug!(slot = index, "expired slot timer ignored");
            return;
        }
        self.slots[index].reload_timer = None;

        let action = {
            let slot = &self.slots[index];
            if slot.skip {
                // Recovery probe for a degraded page.
                match slot.primary.or(slot.shadow) {
                    Some(id) => SlotTimerAction::Reload(id),
                    None => SlotTimerAction::Nothing,
                }
            } else if let Some(shadow) = slot.shadow {
                // A replacement is already loading off-screen; refresh it in
                // place, the viewer cannot see it.
                SlotTimerAction::Reload(shadow)
            } else if slot.primary.is_some() {
                // Never reload the visible primary: load a fresh copy
                // off-screen and swap it in once ready.
                SlotTimerAction::CreateShadow(slot.page.url.clone())
            } else {
                SlotTimerAction::CreatePrimary(slot.page.url.clone())
            }
        };

        match action {
            SlotTimerAction::Reload(id) => {
                debug!(slot = index, %id, "reloading resource on timer");
                if let Err(e) = self.controller.reload(id).await {
                    warn!(%id, error = %e, "timed reload failed");
                    if self.slots[index].skip {
                        // Keep probing the degraded page.
                        self.arm_recovery_timer(index);
                    }
                }
            }
            SlotTimerAction::CreateShadow(url) => self.create_fresh(index, url, false).await,
            SlotTimerAction::CreatePrimary(url) => self.create_fresh(index, url, true).await,
            SlotTimerAction::Nothing => {}
        }
    }

    /// Create a fresh background resource for a slot whose timer elapsed,
    /// attaching it as either the replacement shadow or a new primary.
    async fn create_fresh(&mut self, index: usize, url: String, as_primary: bool) {
        debug!(slot = index, url, as_primary, "creating fresh resource on timer");
        match self.controller.create(&url, false).await {
            Ok(new_id) => {
                let slot = &mut self.slots[index];
                if as_primary {
                    slot.primary = Some(new_id);
                    slot.primary_ready = false;
                } else {
                    slot.shadow = Some(new_id);
                    slot.shadow_ready = false;
                }
                self.state.resource_ids.push(new_id);
                self.save_state().await;
            }
            Err(e) => {
                warn!(slot = index, url, error = %e, "failed to create fresh resource");
            }
        }
    }

    // ------------------------------------------------------------------
    // Internal plumbing
    // ------------------------------------------------------------------

    async fn handle_internal(&mut self, message: Internal) {
        match message {
            Internal::RotateTick { token } => {
                let current = self
                    .rotation_timer
                    .as_ref()
                    .map(|timer| timer.matches(token))
                    .unwrap_or(false);
                if current {
                    self.rotation_timer = None;
                    self.rotate().await;
                } else {
                    debug!("expired rotation tick ignored");
                }
            }
            Internal::SlotTimer { slot, token } => {
                self.on_slot_timer(slot, token).await;
            }
            Internal::ConfigPoll { token } => {
                let current = self
                    .poll_timer
                    .as_ref()
                    .map(|timer| timer.matches(token))
                    .unwrap_or(false);
                if current {
                    self.poll_timer = None;
                    self.poll_remote().await;
                } else {
                    debug!("expired configuration poll ignored");
                }
            }
        }
    }

    fn find_slot(&self, id: ResourceId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.owns(id))
    }

    fn next_token(&mut self) -> u64 {
        self.timer_seq += 1;
        self.timer_seq
    }

    fn arm_rotation_timer(&mut self, delay: Duration) {
        let token = self.next_token();
        debug!(secs = delay.as_secs(), "scheduling next rotation tick");
        self.rotation_timer = Some(TimerGuard::spawn(
            token,
            delay,
            self.internal_tx.clone(),
            Internal::RotateTick { token },
        ));
    }

    fn arm_poll_timer(&mut self, interval: Duration) {
        let token = self.next_token();
        debug!(secs = interval.as_secs(), "scheduling remote configuration poll");
        self.poll_timer = Some(TimerGuard::spawn(
            token,
            interval,
            self.internal_tx.clone(),
            Internal::ConfigPoll { token },
        ));
    }

    fn arm_recovery_timer(&mut self, index: usize) {
        let token = self.next_token();
        let delay = self.slots[index].recovery_delay();
        self.slots[index].reload_timer = Some(TimerGuard::spawn(
            token,
            delay,
            self.internal_tx.clone(),
            Internal::SlotTimer { slot: index, token },
        ));
    }

    /// Update and persist the rotation state. Writes are skipped when
    /// nothing changed, so an unchanged transition causes no store churn.
    async fn set_rotation_state(
        &mut self,
        rotating: bool,
        resource_ids: Option<Vec<ResourceId>>,
    ) -> Result<()> {
        if self.state.is_rotating == rotating && resource_ids.is_none() {
            return Ok(());
        }
        self.state.is_rotating = rotating;
        if let Some(ids) = resource_ids {
            self.state.resource_ids = ids;
        }
        self.state_store.save(&self.state).await?;
        Ok(())
    }

    /// Persist the current state, logging instead of propagating: lifecycle
    /// paths must keep running even when the store misbehaves.
    async fn save_state(&mut self) {
        if let Err(e) = self.state_store.save(&self.state).await {
            warn!(error = %e, "failed to persist rotation state");
        }
    }
}
