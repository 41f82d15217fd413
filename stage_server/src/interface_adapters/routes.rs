use crate::interface_adapters::net::{
    collision_handler, create_stage_handler, remove_stage_handler, ws_handler,
};
use crate::interface_adapters::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/stages", post(create_stage_handler))
        .route("/stages/{stage_id}", delete(remove_stage_handler))
        .route("/stages/{stage_id}/collisions", post(collision_handler))
        .with_state(state)
}
