//! Simulated resource controller
//!
//! In-process stand-in for a real display host. Resources are bookkeeping
//! entries; loading is simulated by emitting a load event after a short
//! delay. URLs can be given a failure budget so the first N load attempts
//! error before succeeding, which drives the retry/skip/recovery paths in
//! tests and demos.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use super::{ControllerError, ControllerResult, ResourceController, ResourceEvent, ResourceId};

/// Everything the simulated host was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimAction {
    Created {
        id: ResourceId,
        url: String,
        active: bool,
    },
    Activated(ResourceId),
    Reloaded(ResourceId),
    Removed(ResourceId),
    /// Viewer closed the resource out-of-band
    Closed(ResourceId),
    Fullscreen,
}

#[derive(Debug, Clone)]
struct SimResource {
    url: String,
    active: bool,
}

#[derive(Default)]
struct SimInner {
    next_id: u64,
    resources: HashMap<ResourceId, SimResource>,
    /// Remaining load attempts per URL that should fail. `u32::MAX` fails forever.
    fail_budget: HashMap<String, u32>,
    log: Vec<SimAction>,
}

impl SimInner {
    fn consume_failure(&mut self, url: &str) -> bool {
        match self.fail_budget.get_mut(url) {
            Some(0) | None => false,
            Some(n) if *n == u32::MAX => true,
            Some(n) => {
                *n -= 1;
                true
            }
        }
    }
}

/// Simulated display host emitting load events after a configurable delay.
pub struct SimulatedController {
    events: mpsc::UnboundedSender<ResourceEvent>,
    load_delay: Duration,
    inner: Mutex<SimInner>,
}

impl SimulatedController {
    /// Create a controller and the event stream the scheduler consumes.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ResourceEvent>) {
        Self::with_load_delay(Duration::from_millis(10))
    }

    /// Create a controller whose simulated loads settle after `load_delay`.
    pub fn with_load_delay(
        load_delay: Duration,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<ResourceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = Arc::new(Self {
            events: tx,
            load_delay,
            inner: Mutex::new(SimInner::default()),
        });
        (controller, rx)
    }

    /// Make the first `count` load attempts of `url` fail.
    pub fn fail_first_loads(&self, url: &str, count: u32) {
        self.inner
            .lock()
            .expect("sim lock")
            .fail_budget
            .insert(url.to_string(), count);
    }

    /// Make every load attempt of `url` fail until the budget is replaced.
    pub fn fail_always(&self, url: &str) {
        self.fail_first_loads(url, u32::MAX);
    }

    /// Stop failing loads of `url`.
    pub fn clear_failures(&self, url: &str) {
        self.inner.lock().expect("sim lock").fail_budget.remove(url);
    }

    /// Snapshot of every action performed so far.
    pub fn actions(&self) -> Vec<SimAction> {
        self.inner.lock().expect("sim lock").log.clone()
    }

    /// Ids of resources currently alive.
    pub fn live_resources(&self) -> Vec<ResourceId> {
        let mut ids: Vec<_> = self
            .inner
            .lock()
            .expect("sim lock")
            .resources
            .keys()
            .copied()
            .collect();
        ids.sort();
        ids
    }

    /// The resource currently in the foreground, if any.
    pub fn active_resource(&self) -> Option<(ResourceId, String)> {
        self.inner
            .lock()
            .expect("sim lock")
            .resources
            .iter()
            .find(|(_, r)| r.active)
            .map(|(id, r)| (*id, r.url.clone()))
    }

    /// Number of activate calls issued for `id`.
    pub fn activation_count(&self, id: ResourceId) -> usize {
        self.actions()
            .iter()
            .filter(|a| matches!(a, SimAction::Activated(aid) if *aid == id))
            .count()
    }

    /// Simulate the viewer closing a resource: it vanishes from the host and
    /// a removal event is emitted, exactly as if a tab were closed by hand.
    pub fn close_externally(&self, id: ResourceId) {
        let existed = {
            let mut inner = self.inner.lock().expect("sim lock");
            let existed = inner.resources.remove(&id).is_some();
            if existed {
                inner.log.push(SimAction::Closed(id));
            }
            existed
        };
        if existed {
            let _ = self.events.send(ResourceEvent::Removed { id });
        }
    }

    fn schedule_load(&self, id: ResourceId, url: String, fail: bool) {
        let events = self.events.clone();
        let delay = self.load_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let event = if fail {
                ResourceEvent::LoadError { id, url }
            } else {
                ResourceEvent::LoadComplete { id, url }
            };
            // Receiver gone means the scheduler shut down; nothing to do.
            let _ = events.send(event);
        });
    }
}

#[async_trait]
impl ResourceController for SimulatedController {
    async fn create(&self, url: &str, active: bool) -> ControllerResult<ResourceId> {
        let (id, fail) = {
            let mut inner = self.inner.lock().expect("sim lock");
            inner.next_id += 1;
            let id = ResourceId(inner.next_id);
            if active {
                for resource in inner.resources.values_mut() {
                    resource.active = false;
                }
            }
            inner.resources.insert(
                id,
                SimResource {
                    url: url.to_string(),
                    active,
                },
            );
            inner.log.push(SimAction::Created {
                id,
                url: url.to_string(),
                active,
            });
            let fail = inner.consume_failure(url);
            (id, fail)
        };

        debug!(%id, url, active, "sim: resource created");
        self.schedule_load(id, url.to_string(), fail);
        Ok(id)
    }

    async fn activate(&self, id: ResourceId) -> ControllerResult<()> {
        let mut inner = self.inner.lock().expect("sim lock");
        if !inner.resources.contains_key(&id) {
            return Err(ControllerError::UnknownResource(id));
        }
        for (rid, resource) in inner.resources.iter_mut() {
            resource.active = *rid == id;
        }
        inner.log.push(SimAction::Activated(id));
        debug!(%id, "sim: resource activated");
        Ok(())
    }

    async fn reload(&self, id: ResourceId) -> ControllerResult<()> {
        let (url, fail) = {
            let mut inner = self.inner.lock().expect("sim lock");
            let url = inner
                .resources
                .get(&id)
                .map(|r| r.url.clone())
                .ok_or(ControllerError::UnknownResource(id))?;
            inner.log.push(SimAction::Reloaded(id));
            let fail = inner.consume_failure(&url);
            (url, fail)
        };

        debug!(%id, url, "sim: resource reloading");
        self.schedule_load(id, url, fail);
        Ok(())
    }

    async fn remove(&self, id: ResourceId) -> ControllerResult<()> {
        let existed = {
            let mut inner = self.inner.lock().expect("sim lock");
            let existed = inner.resources.remove(&id).is_some();
            if existed {
                inner.log.push(SimAction::Removed(id));
            }
            existed
        };
        if !existed {
            return Err(ControllerError::UnknownResource(id));
        }

        debug!(%id, "sim: resource removed");
        let _ = self.events.send(ResourceEvent::Removed { id });
        Ok(())
    }

    async fn enter_fullscreen(&self) -> ControllerResult<()> {
        self.inner
            .lock()
            .expect("sim lock")
            .log
            .push(SimAction::Fullscreen);
        debug!("sim: fullscreen requested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_create_emits_load_complete() {
        let (sim, mut events) = SimulatedController::new();
        let id = sim.create("https://a.example", true).await.unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            ResourceEvent::LoadComplete {
                id,
                url: "https://a.example".into()
            }
        );
        assert_eq!(sim.active_resource().unwrap().0, id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_budget_is_consumed() {
        let (sim, mut events) = SimulatedController::new();
        sim.fail_first_loads("https://bad.example", 1);

        let id = sim.create("https://bad.example", false).await.unwrap();
        assert!(matches!(
            events.recv().await.unwrap(),
            ResourceEvent::LoadError { .. }
        ));

        // Budget spent: the reload succeeds.
        sim.reload(id).await.unwrap();
        assert!(matches!(
            events.recv().await.unwrap(),
            ResourceEvent::LoadComplete { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_emits_removed_event() {
        let (sim, mut events) = SimulatedController::new();
        let id = sim.create("https://a.example", true).await.unwrap();
        events.recv().await.unwrap();

        sim.remove(id).await.unwrap();
        assert_eq!(events.recv().await.unwrap(), ResourceEvent::Removed { id });
        assert!(sim.live_resources().is_empty());

        // Second removal refers to an unknown handle.
        assert!(sim.remove(id).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_is_exclusive() {
        let (sim, _events) = SimulatedController::new();
        let a = sim.create("https://a.example", true).await.unwrap();
        let b = sim.create("https://b.example", false).await.unwrap();

        sim.activate(b).await.unwrap();
        assert_eq!(sim.active_resource().unwrap().0, b);

        sim.activate(a).await.unwrap();
        assert_eq!(sim.active_resource().unwrap().0, a);
        assert_eq!(sim.activation_count(a), 1);
    }
}
