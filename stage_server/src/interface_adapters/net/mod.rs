// Network adapter modules split by client sockets vs internal HTTP routes.

pub mod client;
pub mod internal;

pub use client::{spawn_stage_serializer, ws_handler};
pub use internal::{collision_handler, create_stage_handler, remove_stage_handler};
