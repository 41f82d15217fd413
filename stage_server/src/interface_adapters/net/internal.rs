use crate::domain::Collision;
use crate::interface_adapters::http::error_response;
use crate::interface_adapters::net::client::launch_stage;
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::next_stage_id;
use crate::use_cases::{GameEvent, RegistryError};

use axum::{
    body::Bytes,
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

const MAX_GENERATED_ID_ATTEMPTS: usize = 64;

#[derive(Debug, Default, serde::Deserialize)]
pub struct StageInitRequest {
    // Stage id chosen by the caller; generated when absent.
    #[serde(default)]
    stage_id: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct StageInitResponse {
    // The stage id that was created.
    stage_id: String,
}

/// Overlap reported by the physics service for the stage's ship.
#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(tag = "kind")]
pub enum CollisionRequest {
    Hazard,
    FuelCapsule,
    EnemyDestroyed { points: u32 },
}

impl From<CollisionRequest> for Collision {
    fn from(request: CollisionRequest) -> Self {
        match request {
            CollisionRequest::Hazard => Collision::Hazard,
            CollisionRequest::FuelCapsule => Collision::FuelCapsule,
            CollisionRequest::EnemyDestroyed { points } => Collision::EnemyDestroyed { points },
        }
    }
}

pub async fn create_stage_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> impl IntoResponse {
    // An empty body asks for a generated id.
    let payload = if body.is_empty() {
        StageInitRequest::default()
    } else {
        match serde_json::from_slice::<StageInitRequest>(&body) {
            Ok(payload) => payload,
            Err(_) => return error_response(StatusCode::BAD_REQUEST, "invalid stage request"),
        }
    };
    let Some(requested) = payload.stage_id else {
        return launch_generated_stage(&state).await;
    };
    let stage_id = requested.trim().to_string();
    if stage_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "stage_id must not be empty");
    }

    match launch_stage(&state.stage_registry, stage_id.clone()).await {
        Ok(_) => created(stage_id),
        Err(RegistryError::AlreadyExists) => {
            error_response(StatusCode::CONFLICT, "stage already exists")
        }
    }
}

// Generated ids can collide with ids callers picked themselves; skip those.
async fn launch_generated_stage(state: &AppState) -> Response {
    for _ in 0..MAX_GENERATED_ID_ATTEMPTS {
        let stage_id = next_stage_id();
        match launch_stage(&state.stage_registry, stage_id.clone()).await {
            Ok(_) => return created(stage_id),
            Err(RegistryError::AlreadyExists) => {
                debug!(%stage_id, "generated stage id taken; retrying");
            }
        }
    }
    error_response(StatusCode::SERVICE_UNAVAILABLE, "no free stage id")
}

fn created(stage_id: String) -> Response {
    (StatusCode::CREATED, Json(StageInitResponse { stage_id })).into_response()
}

pub async fn collision_handler(
    State(state): State<Arc<AppState>>,
    Path(stage_id): Path<String>,
    Json(payload): Json<CollisionRequest>,
) -> impl IntoResponse {
    let Some(stage) = state.stage_registry.get_stage(&stage_id).await else {
        return error_response(StatusCode::NOT_FOUND, "stage not found");
    };

    // Physics reports must not wait on a busy world; drop and tell the caller.
    match stage
        .input_tx
        .try_send(GameEvent::Collision(payload.into()))
    {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(TrySendError::Full(_)) => {
            warn!(%stage_id, "input channel full; collision dropped");
            error_response(StatusCode::SERVICE_UNAVAILABLE, "stage busy")
        }
        Err(TrySendError::Closed(_)) => error_response(StatusCode::GONE, "stage has exited"),
    }
}

pub async fn remove_stage_handler(
    State(state): State<Arc<AppState>>,
    Path(stage_id): Path<String>,
) -> impl IntoResponse {
    if state.stage_registry.remove_stage(&stage_id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_response(StatusCode::NOT_FOUND, "stage not found")
    }
}
