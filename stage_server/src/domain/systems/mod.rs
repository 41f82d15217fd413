// Per-tick simulation systems run by the stage world.

pub mod movement;
pub mod weapons;
