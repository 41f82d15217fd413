use serde::Deserialize;

/// Gameplay tuning for stage flow timing.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct StageTuning {
    /// Seconds between stage start and the first Playing state.
    pub preparing_delay: f32,

    /// Seconds between a death and the respawn.
    pub respawn_delay: f32,

    /// Seconds the game-over screen stays up before the session exits.
    pub game_over_delay: f32,
}

impl Default for StageTuning {
    fn default() -> Self {
        Self {
            preparing_delay: 3.0,
            respawn_delay: 2.0,
            game_over_delay: 5.0,
        }
    }
}
