//! Temporary diagnostic test (not part of the suite; delete after use).

use std::sync::Arc;
use std::time::Duration;

use carousel::controller::{ResourceId, SimAction, SimulatedController};
use carousel::models::{keys, PageSpec, RotationConfig};
use carousel::scheduler::{RotationScheduler, SchedulerHandle};
use carousel::store::{self, MemoryStore};

fn config(specs: &[(&str, i64, i64)]) -> RotationConfig {
    RotationConfig::new(
        specs
            .iter()
            .map(|(url, delay, reload)| PageSpec::new(*url, *delay, *reload))
            .collect(),
    )
}

async fn seed_local(store: &MemoryStore, config: &RotationConfig) {
    store::set_typed(store, keys::USE_REMOTE_CONFIG, &false)
        .await
        .unwrap();
    store::set_typed(store, keys::LOCAL_CONFIG, config)
        .await
        .unwrap();
}

fn created_id(sim: &SimulatedController, url: &str) -> ResourceId {
    sim.actions()
        .iter()
        .find_map(|action| match action {
            SimAction::Created { id, url: u, .. } if u == url => Some(*id),
            _ => None,
        })
        .expect("no resource created for url")
}

async fn start_rotation(
    store: Arc<MemoryStore>,
    sim: Arc<SimulatedController>,
    events: tokio::sync::mpsc::UnboundedReceiver<carousel::controller::ResourceEvent>,
) -> SchedulerHandle {
    let scheduler = RotationScheduler::spawn(sim, store, events);
    scheduler.start().await.unwrap();
    scheduler
}

#[tokio::test(start_paused = true)]
async fn diag_cycle_exact() {
    let store = Arc::new(MemoryStore::new());
    seed_local(
        &store,
        &config(&[
            ("https://a.example", 3, 0),
            ("https://b.example", 3, 0),
            ("https://c.example", 3, 0),
        ]),
    )
    .await;

    let (sim, events) = SimulatedController::new();
    let _scheduler = start_rotation(store, Arc::clone(&sim), events).await;

    let a = created_id(&sim, "https://a.example");
    let b = created_id(&sim, "https://b.example");
    let _c = created_id(&sim, "https://c.example");

    assert_eq!(sim.active_resource().unwrap().0, a);
    tokio::time::sleep(Duration::from_millis(3_100)).await;
    let log = carousel::scheduler::engine::DIAG.lock().unwrap().clone();
    for line in &log {
        eprintln!("{line}");
    }
    eprintln!("after-sleep t={:?}", tokio::time::Instant::now());
    assert_eq!(sim.active_resource().unwrap().0, b);
}
