use serde::Deserialize;

/// Gameplay tuning for the pilot's ship and its stats.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Lives at the start of a stage.
    pub initial_lives: u8,

    /// Half size of the ship's bounding box in world units (x, y).
    pub extent: [f32; 2],

    /// Seconds fire must be held before power-up activation mode engages.
    pub activation_hold: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            initial_lives: 3,
            extent: [320.0, 180.0],
            activation_hold: 0.25,
        }
    }
}
