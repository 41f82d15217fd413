// Runtime bootstrap and process configuration.

pub mod config;
pub mod server;
