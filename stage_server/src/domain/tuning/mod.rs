// Gameplay tuning, kept apart from runtime/server configuration.

pub mod camera;
pub mod movement;
pub mod player;
pub mod stage;
pub mod weapons;

use serde::Deserialize;

pub use camera::CameraTuning;
pub use movement::MovementTuning;
pub use player::PlayerTuning;
pub use stage::StageTuning;
pub use weapons::WeaponTuning;

/// Every tunable a stage world needs, passed explicitly to each world.
///
/// Missing sections or fields in a tuning file fall back to their defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StageSettings {
    pub stage: StageTuning,
    pub player: PlayerTuning,
    pub movement: MovementTuning,
    pub camera: CameraTuning,
    pub weapons: WeaponTuning,
}
