//! Persistence wrapper for the rotation state
//!
//! The rotation state is written on every transition that changes the
//! rotating flag or the active-handle set, and read once at process start
//! to recover from or clean up after a previous run.

use std::sync::Arc;
use tracing::debug;

use super::{get_typed, set_typed, StateStore, StoreResult};
use crate::models::{keys, RotationState};

/// Thin typed wrapper over the state store for [`RotationState`].
#[derive(Clone)]
pub struct RotationStateStore {
    store: Arc<dyn StateStore>,
}

impl RotationStateStore {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Load the persisted rotation state, defaulting to "not rotating, no
    /// resources" when nothing was stored yet.
    pub async fn load(&self) -> StoreResult<RotationState> {
        let state = get_typed::<RotationState>(self.store.as_ref(), keys::ROTATION_STATE)
            .await?
            .unwrap_or_default();
        debug!(
            is_rotating = state.is_rotating,
            resources = state.resource_ids.len(),
            "loaded rotation state"
        );
        Ok(state)
    }

    pub async fn save(&self, state: &RotationState) -> StoreResult<()> {
        debug!(
            is_rotating = state.is_rotating,
            resources = state.resource_ids.len(),
            "saving rotation state"
        );
        set_typed(self.store.as_ref(), keys::ROTATION_STATE, state).await
    }
}
