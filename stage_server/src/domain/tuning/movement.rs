use serde::Deserialize;

/// Gameplay tuning for the 2D movement model.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    /// Maximum per-tick displacement at speed-up level 0.
    pub initial_speed: f32,

    /// Speed gained per second while a direction is held, at level 0.
    pub initial_acceleration: f32,

    /// Fraction of the base speed and acceleration added per speed-up level.
    pub speed_up_increment: f32,

    /// Banking limit in degrees while moving vertically.
    pub max_rotation: f32,

    /// Banking rate in degrees per second.
    pub rotation_speed: f32,

    /// Rate in degrees per second at which banking returns to level flight.
    pub rotation_recovery_speed: f32,

    /// Extra inset from each viewport edge, in world units.
    pub margin_up: f32,
    pub margin_down: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            initial_speed: 60.0,
            initial_acceleration: 150.0,
            speed_up_increment: 0.25,
            max_rotation: 37.5,
            rotation_speed: 250.0,
            rotation_recovery_speed: 200.0,
            margin_up: 0.0,
            margin_down: 0.0,
            margin_left: 50.0,
            margin_right: 50.0,
        }
    }
}
