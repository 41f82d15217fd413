// Domain layer: stage rules, flight model and projection math.

pub mod arena;
pub mod player;
pub mod power_up;
pub mod projection;
pub mod replication;
pub mod stage;
pub mod systems;
pub mod timers;
pub mod tuning;
pub mod world;

pub use player::{PlayerState, PlayerStatus};
pub use power_up::PowerUp;
pub use stage::{StageState, StageStateMachine};
pub use world::{Collision, PilotInput, StageWorld, Tickable, WorldSnapshot};
