// Per-pilot state machine: lives, score and power-up progression.

use super::power_up::PowerUp;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Highest speed-up level and laser power a pilot can reach.
pub const MAX_STAT_LEVEL: u8 = 4;
/// Lives a pilot can start a stage with.
pub const MAX_LIVES: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerState {
    #[default]
    Playing,
    Destroyed,
}

impl TryFrom<u8> for PlayerState {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(PlayerState::Playing),
            1 => Ok(PlayerState::Destroyed),
            other => Err(other),
        }
    }
}

/// Everything the stage tracks about the pilot between respawns.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStatus {
    current_state: PlayerState,
    game_score: u32,
    lives: u8,
    speed_up_level: u8,
    laser_power: u8,
    plasma_bombs: bool,
    homing_missiles: bool,
    seeker_missiles: bool,
    selected_power_up: PowerUp,
    activation_mode: bool,
}

impl Default for PlayerStatus {
    fn default() -> Self {
        Self::new(MAX_LIVES)
    }
}

impl PlayerStatus {
    /// Starts a pilot with `lives`, capped at [`MAX_LIVES`].
    pub fn new(lives: u8) -> Self {
        if lives > MAX_LIVES {
            warn!(lives, max = MAX_LIVES, "initial lives above the maximum; capping");
        }
        let lives = lives.min(MAX_LIVES);
        Self {
            current_state: PlayerState::Playing,
            game_score: 0,
            lives,
            speed_up_level: 0,
            laser_power: 0,
            plasma_bombs: false,
            homing_missiles: false,
            seeker_missiles: false,
            selected_power_up: PowerUp::SpeedUp,
            activation_mode: false,
        }
    }

    pub fn current_state(&self) -> PlayerState {
        self.current_state
    }

    /// Moves to `state`. Entering Destroyed costs a life and clears every
    /// power-up; entering Playing changes nothing else.
    ///
    /// Returns false when `state` is already the current state.
    pub fn set_state(&mut self, state: PlayerState) -> bool {
        if self.current_state == state {
            return false;
        }

        match state {
            PlayerState::Playing => {
                debug!("player state -> Playing");
                self.current_state = state;
            }
            PlayerState::Destroyed => {
                debug!("player state -> Destroyed");
                self.current_state = state;
                self.reduce_lives();
            }
        }
        true
    }

    /// Applies a raw state request, e.g. one decoded off the wire.
    /// Unknown codes are rejected and leave the pilot untouched.
    pub fn set_state_code(&mut self, code: u8) -> bool {
        match PlayerState::try_from(code) {
            Ok(state) => self.set_state(state),
            Err(code) => {
                warn!(code, "tried to set an invalid player state; state not changed");
                false
            }
        }
    }

    /// Explicit respawn after a death.
    pub fn restart(&mut self) -> bool {
        self.set_state(PlayerState::Playing)
    }

    fn reduce_lives(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.speed_up_level = 0;
        self.laser_power = 0;
        self.plasma_bombs = false;
        self.homing_missiles = false;
        self.seeker_missiles = false;
        self.selected_power_up = PowerUp::SpeedUp;
        self.activation_mode = false;
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    pub fn game_score(&self) -> u32 {
        self.game_score
    }

    pub fn add_score(&mut self, points: u32) {
        self.game_score = self.game_score.saturating_add(points);
    }

    pub fn speed_up_level(&self) -> u8 {
        self.speed_up_level
    }

    pub fn laser_power(&self) -> u8 {
        self.laser_power
    }

    pub fn plasma_bombs(&self) -> bool {
        self.plasma_bombs
    }

    pub fn homing_missiles(&self) -> bool {
        self.homing_missiles
    }

    pub fn seeker_missiles(&self) -> bool {
        self.seeker_missiles
    }

    pub fn selected_power_up(&self) -> PowerUp {
        self.selected_power_up
    }

    pub fn activation_mode(&self) -> bool {
        self.activation_mode
    }

    pub fn set_activation_mode(&mut self, enabled: bool) {
        if self.activation_mode != enabled {
            debug!(enabled, "power-up activation mode");
            self.activation_mode = enabled;
        }
    }

    /// Cycles the selector, or spends the capsule on the selected power-up
    /// while activation mode is engaged.
    pub fn fuel_capsule_collected(&mut self) {
        if self.activation_mode {
            self.activate_selected_power_up();
        } else {
            self.selected_power_up = self.selected_power_up.next();
        }
    }

    pub fn activate_selected_power_up(&mut self) {
        match self.selected_power_up {
            PowerUp::SpeedUp => {
                self.speed_up_level = (self.speed_up_level + 1).min(MAX_STAT_LEVEL);
            }
            PowerUp::LaserPower => {
                self.laser_power = (self.laser_power + 1).min(MAX_STAT_LEVEL);
            }
            PowerUp::PlasmaBombs => self.plasma_bombs = true,
            PowerUp::HomingMissiles => self.homing_missiles = true,
            PowerUp::SeekerMissiles => self.seeker_missiles = true,
        }
        debug!(power_up = ?self.selected_power_up, "power-up activated");
        self.selected_power_up = PowerUp::SpeedUp;
    }
}
