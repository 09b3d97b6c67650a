//! File-backed state store and restart persistence tests.

use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;

use carousel::controller::SimulatedController;
use carousel::models::{keys, PageSpec, RotationConfig, RotationState};
use carousel::scheduler::RotationScheduler;
use carousel::store::{self, JsonFileStore, RotationStateStore, StateStore};

fn one_page_config() -> RotationConfig {
    RotationConfig::new(vec![PageSpec::new("https://a.example", 3, 0)])
}

#[tokio::test]
async fn test_file_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    {
        let store = JsonFileStore::new(&path);
        store::set_typed(&store, keys::USE_REMOTE_CONFIG, &false)
            .await
            .unwrap();
        store::set_typed(&store, keys::LOCAL_CONFIG, &one_page_config())
            .await
            .unwrap();
    }

    let reopened = JsonFileStore::new(&path);
    let flag: Option<bool> = store::get_typed(&reopened, keys::USE_REMOTE_CONFIG)
        .await
        .unwrap();
    assert_eq!(flag, Some(false));

    let config: Option<RotationConfig> = store::get_typed(&reopened, keys::LOCAL_CONFIG)
        .await
        .unwrap();
    assert_eq!(config, Some(one_page_config()));
}

#[tokio::test]
async fn test_missing_file_reads_as_empty() {
    let dir = tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("nonexistent.json"));

    let value: Option<bool> = store::get_typed(&store, keys::USE_REMOTE_CONFIG)
        .await
        .unwrap();
    assert_eq!(value, None);
}

#[tokio::test]
async fn test_rotation_state_store_defaults_when_absent() {
    let dir = tempdir().unwrap();
    let store: Arc<dyn StateStore> =
        Arc::new(JsonFileStore::new(dir.path().join("state.json")));
    let rotation = RotationStateStore::new(Arc::clone(&store));

    let state = rotation.load().await.unwrap();
    assert!(!state.is_rotating);
    assert!(state.resource_ids.is_empty());

    rotation
        .save(&RotationState {
            is_rotating: true,
            resource_ids: vec![],
        })
        .await
        .unwrap();
    assert!(rotation.load().await.unwrap().is_rotating);
}

#[tokio::test(start_paused = true)]
async fn test_crashed_run_is_cleaned_up_on_next_start() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let seed = JsonFileStore::new(&path);
    store::set_typed(&seed, keys::USE_REMOTE_CONFIG, &false)
        .await
        .unwrap();
    store::set_typed(&seed, keys::LOCAL_CONFIG, &one_page_config())
        .await
        .unwrap();

    // First run: rotation starts, then the process "crashes" (the handle is
    // dropped without a stop, leaving is_rotating and the ids behind).
    {
        let store = Arc::new(JsonFileStore::new(&path));
        let (sim, events) = SimulatedController::new();
        let scheduler = RotationScheduler::spawn(sim.clone(), store.clone(), events);
        scheduler.start().await.unwrap();

        let state: RotationState = store::get_typed(store.as_ref(), keys::ROTATION_STATE)
            .await
            .unwrap()
            .unwrap();
        assert!(state.is_rotating);
        assert_eq!(state.resource_ids.len(), 1);
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Second run on the same store file: leftovers are disposed and the
    // rotation resumes on its own.
    let store = Arc::new(JsonFileStore::new(&path));
    let (sim, events) = SimulatedController::new();
    let scheduler = RotationScheduler::spawn(sim.clone(), store.clone(), events);

    assert!(scheduler.is_rotating().await.unwrap());
    let state: RotationState = store::get_typed(store.as_ref(), keys::ROTATION_STATE)
        .await
        .unwrap()
        .unwrap();
    assert!(state.is_rotating);
    assert_eq!(state.resource_ids.len(), 1);
    assert_eq!(sim.live_resources(), state.resource_ids);
}
