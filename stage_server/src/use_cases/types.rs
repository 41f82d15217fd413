// Use-case level inputs/outputs for the stage loop.

use crate::domain::replication::PlayerDelta;
use crate::domain::projection::Viewport;
use crate::domain::{Collision, PilotInput, StageState, WorldSnapshot};

#[derive(Debug, Clone)]
pub enum GameEvent {
    /// A connection took control of the ship.
    Join { player_id: u64 },
    Leave { player_id: u64 },
    Input { player_id: u64, input: PilotInput },
    FirePressed { player_id: u64 },
    FireReleased { player_id: u64 },
    Viewport { player_id: u64, viewport: Viewport },
    /// Overlap reported by the physics service.
    Collision(Collision),
}

/// Session lifecycle as seen from outside the world task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Preparing,
    Playing,
    GameOver,
    /// The game-over delay elapsed; the world task has stopped.
    Exited,
}

impl From<StageState> for SessionState {
    fn from(state: StageState) -> Self {
        match state {
            StageState::Preparing => SessionState::Preparing,
            StageState::Playing => SessionState::Playing,
            StageState::GameOver => SessionState::GameOver,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorldUpdate {
    pub tick: u64,
    pub snapshot: WorldSnapshot,
    /// Player fields that changed since the previous tick.
    pub player_delta: Option<PlayerDelta>,
}
