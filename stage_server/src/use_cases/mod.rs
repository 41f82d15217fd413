// Use cases layer: application workflows for the stage server.

pub mod registry;
pub mod stage;
pub mod types;

pub use registry::{RegistryError, StageHandle, StageRegistry, StageRegistrySettings};
pub use types::{GameEvent, SessionState, WorldUpdate};
