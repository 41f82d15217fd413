//! Versioned player replica sent to clients.
//!
//! Clients receive one full [`PlayerReplica`] when they join and a
//! [`PlayerDelta`] in each world update where something changed.

use super::player::{PlayerState, PlayerStatus};
use super::power_up::PowerUp;
use serde::{Deserialize, Serialize};

pub const REPLICATION_VERSION: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationError {
    VersionMismatch { expected: u16, found: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerReplica {
    pub version: u16,
    pub state: PlayerState,
    pub game_score: u32,
    pub lives: u8,
    pub speed_up_level: u8,
    pub laser_power: u8,
    pub plasma_bombs: bool,
    pub homing_missiles: bool,
    pub seeker_missiles: bool,
    pub selected_power_up: PowerUp,
    pub activation_mode: bool,
}

/// Changed fields only; absent fields keep their previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDelta {
    pub version: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<PlayerState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lives: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_up_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laser_power: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plasma_bombs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homing_missiles: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeker_missiles: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_power_up: Option<PowerUp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_mode: Option<bool>,
}

impl From<&PlayerStatus> for PlayerReplica {
    fn from(status: &PlayerStatus) -> Self {
        Self {
            version: REPLICATION_VERSION,
            state: status.current_state(),
            game_score: status.game_score(),
            lives: status.lives(),
            speed_up_level: status.speed_up_level(),
            laser_power: status.laser_power(),
            plasma_bombs: status.plasma_bombs(),
            homing_missiles: status.homing_missiles(),
            seeker_missiles: status.seeker_missiles(),
            selected_power_up: status.selected_power_up(),
            activation_mode: status.activation_mode(),
        }
    }
}

fn changed<T: PartialEq + Copy>(old: T, new: T) -> Option<T> {
    (old != new).then_some(new)
}

impl PlayerReplica {
    /// Fields of `next` that differ from `self`, or `None` when equal.
    pub fn diff(&self, next: &PlayerReplica) -> Option<PlayerDelta> {
        if self == next {
            return None;
        }
        Some(PlayerDelta {
            version: next.version,
            state: changed(self.state, next.state),
            game_score: changed(self.game_score, next.game_score),
            lives: changed(self.lives, next.lives),
            speed_up_level: changed(self.speed_up_level, next.speed_up_level),
            laser_power: changed(self.laser_power, next.laser_power),
            plasma_bombs: changed(self.plasma_bombs, next.plasma_bombs),
            homing_missiles: changed(self.homing_missiles, next.homing_missiles),
            seeker_missiles: changed(self.seeker_missiles, next.seeker_missiles),
            selected_power_up: changed(self.selected_power_up, next.selected_power_up),
            activation_mode: changed(self.activation_mode, next.activation_mode),
        })
    }

    pub fn apply(&mut self, delta: &PlayerDelta) -> Result<(), ReplicationError> {
        if delta.version != self.version {
            return Err(ReplicationError::VersionMismatch {
                expected: self.version,
                found: delta.version,
            });
        }

        if let Some(v) = delta.state {
            self.state = v;
        }
        if let Some(v) = delta.game_score {
            self.game_score = v;
        }
        if let Some(v) = delta.lives {
            self.lives = v;
        }
        if let Some(v) = delta.speed_up_level {
            self.speed_up_level = v;
        }
        if let Some(v) = delta.laser_power {
            self.laser_power = v;
        }
        if let Some(v) = delta.plasma_bombs {
            self.plasma_bombs = v;
        }
        if let Some(v) = delta.homing_missiles {
            self.homing_missiles = v;
        }
        if let Some(v) = delta.seeker_missiles {
            self.seeker_missiles = v;
        }
        if let Some(v) = delta.selected_power_up {
            self.selected_power_up = v;
        }
        if let Some(v) = delta.activation_mode {
            self.activation_mode = v;
        }
        Ok(())
    }
}
