// Stage orchestration for spawning and managing stage worlds.

use crate::domain::tuning::StageSettings;
use crate::use_cases::stage::world_task;
use crate::use_cases::{GameEvent, SessionState, WorldUpdate};
use axum::extract::ws::Utf8Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify, RwLock, broadcast, mpsc, watch};
use tracing::info;

/// Shared configuration for spawning stage worlds.
#[derive(Debug, Clone)]
pub struct StageRegistrySettings {
    /// Capacity for inbound pilot and physics events.
    pub input_channel_capacity: usize,
    /// Capacity for broadcast world updates.
    pub world_broadcast_capacity: usize,
    /// Fixed tick interval for the stage loop.
    pub tick_interval: Duration,
    /// Gameplay tuning handed to every new world.
    pub stage: StageSettings,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// Stage already exists and cannot be re-created.
    AlreadyExists,
}

/// Per-stage channels and pilot ownership.
#[derive(Clone)]
pub struct StageHandle {
    /// Identifier clients use to target this stage.
    pub stage_id: Arc<str>,
    /// Sender for events into the stage world task.
    pub input_tx: mpsc::Sender<GameEvent>,
    /// Broadcast sender for raw world updates.
    pub world_tx: broadcast::Sender<WorldUpdate>,
    /// Broadcast sender for serialized world updates.
    pub world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    /// Watch sender holding the latest serialized full player snapshot.
    pub world_latest_tx: watch::Sender<Utf8Bytes>,
    /// Watch sender for session lifecycle changes.
    pub session_tx: watch::Sender<SessionState>,
    // Stops the world task when the stage is removed.
    shutdown: Arc<Notify>,
    // Connection currently flying the ship, if any.
    pilot: Arc<Mutex<Option<u64>>>,
}

impl StageHandle {
    /// Makes `player_id` the pilot if nobody holds the controls yet.
    pub async fn claim_pilot(&self, player_id: u64) -> bool {
        let mut pilot = self.pilot.lock().await;
        match *pilot {
            Some(_) => false,
            None => {
                *pilot = Some(player_id);
                true
            }
        }
    }

    /// Frees the controls if `player_id` still holds them.
    pub async fn release_pilot(&self, player_id: u64) {
        let mut pilot = self.pilot.lock().await;
        if *pilot == Some(player_id) {
            *pilot = None;
        }
    }

    fn is_same_stage(&self, other: &StageHandle) -> bool {
        Arc::ptr_eq(&self.shutdown, &other.shutdown)
    }
}

/// Thread-safe registry for active stages.
pub struct StageRegistry {
    /// Global settings applied to newly created stages.
    settings: StageRegistrySettings,
    /// Map of stage id to active handle.
    stages: RwLock<HashMap<String, StageHandle>>,
}

impl StageRegistry {
    pub fn new(settings: StageRegistrySettings) -> Self {
        Self {
            settings,
            stages: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a new stage and spawns its world task.
    pub async fn create_stage(&self, stage_id: String) -> Result<StageHandle, RegistryError> {
        let mut stages = self.stages.write().await;
        if stages.contains_key(&stage_id) {
            return Err(RegistryError::AlreadyExists);
        }

        // Channel wiring for the stage world loop.
        let (input_tx, input_rx) = mpsc::channel::<GameEvent>(self.settings.input_channel_capacity);
        let (world_tx, _world_rx) =
            broadcast::channel::<WorldUpdate>(self.settings.world_broadcast_capacity);
        let (world_bytes_tx, _world_bytes_rx) =
            broadcast::channel::<Utf8Bytes>(self.settings.world_broadcast_capacity);
        let (world_latest_tx, _world_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));
        let (session_tx, _session_rx) = watch::channel::<SessionState>(SessionState::Preparing);
        let shutdown = Arc::new(Notify::new());

        tokio::spawn(world_task(
            input_rx,
            world_tx.clone(),
            session_tx.clone(),
            self.settings.tick_interval,
            self.settings.stage,
            shutdown.clone(),
        ));

        let stage = StageHandle {
            stage_id: Arc::from(stage_id.as_str()),
            input_tx,
            world_tx,
            world_bytes_tx,
            world_latest_tx,
            session_tx,
            shutdown,
            pilot: Arc::new(Mutex::new(None)),
        };

        info!(%stage_id, "stage created");
        stages.insert(stage_id, stage.clone());
        Ok(stage)
    }

    /// Returns a stage handle for the provided id, if it exists.
    pub async fn get_stage(&self, stage_id: &str) -> Option<StageHandle> {
        let stages = self.stages.read().await;
        stages.get(stage_id).cloned()
    }

    /// Removes the stage and stops its world task.
    pub async fn remove_stage(&self, stage_id: &str) -> bool {
        let removed = self.stages.write().await.remove(stage_id);
        match removed {
            Some(stage) => {
                stage.shutdown.notify_one();
                info!(%stage_id, "stage removed");
                true
            }
            None => false,
        }
    }

    pub async fn stage_count(&self) -> usize {
        self.stages.read().await.len()
    }

    /// Drops the stage from the registry once its session exits.
    pub fn spawn_exit_watcher(self: Arc<Self>, stage: &StageHandle) {
        let stage = stage.clone();
        let mut session_rx = stage.session_tx.subscribe();
        tokio::spawn(async move {
            // A closed channel means the world task is gone as well.
            let _ = session_rx
                .wait_for(|state| *state == SessionState::Exited)
                .await;

            let mut stages = self.stages.write().await;
            // The id may already belong to a newer stage.
            if stages
                .get(stage.stage_id.as_ref())
                .is_some_and(|current| current.is_same_stage(&stage))
            {
                stages.remove(stage.stage_id.as_ref());
                info!(stage_id = %stage.stage_id, "stage exited and was removed");
            }
        });
    }
}
