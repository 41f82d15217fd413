// Wire protocol DTOs and conversions for public stage server messages.
// Internal service-to-service DTOs live next to their routes.

use crate::domain::replication::{PlayerDelta, PlayerReplica};
use crate::domain::projection::Viewport;
use crate::domain::systems::weapons::Cannon;
use crate::domain::world::{PawnSnapshot, ProjectileSnapshot};
use crate::domain::{PilotInput, StageState};
use crate::use_cases::{SessionState, WorldUpdate};
use serde::{Deserialize, Serialize};

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Assigned identity and role for the connection after Join.
    Identity { player_id: String, role: Role },
    // Full player replica; clients patch it with the deltas in world updates.
    PlayerSnapshot(PlayerReplica),
    // Stage state for a given tick.
    WorldUpdate(WorldUpdateDto),
    // Session lifecycle transitions.
    StageState(SessionStateDto),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Pilot,
    Spectator,
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    Join(JoinPayload),
    Input(PilotInputDto),
    FirePressed,
    FireReleased,
    Viewport(ViewportDto),
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinPayload {
    #[serde(default)]
    pub display_name: String,
}

/// Axis intensities held during the current tick; zero means released.
#[derive(Debug, Clone, Deserialize)]
pub struct PilotInputDto {
    #[serde(default)]
    pub up: f32,
    #[serde(default)]
    pub down: f32,
    #[serde(default)]
    pub left: f32,
    #[serde(default)]
    pub right: f32,
}

impl From<PilotInputDto> for PilotInput {
    fn from(input: PilotInputDto) -> Self {
        Self {
            up: input.up,
            down: input.down,
            left: input.left,
            right: input.right,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ViewportDto {
    pub width: f32,
    pub height: f32,
}

impl From<ViewportDto> for Viewport {
    fn from(viewport: ViewportDto) -> Self {
        Viewport::new(viewport.width, viewport.height)
    }
}

/// Per-tick stage state sent to clients.
#[derive(Debug, Clone, Serialize)]
pub struct WorldUpdateDto {
    pub tick: u64,
    pub stage_state: StageState,
    pub camera_x: f64,
    pub pawn: PawnDto,
    pub projectiles: Vec<ProjectileDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerDelta>,
}

impl From<WorldUpdate> for WorldUpdateDto {
    fn from(update: WorldUpdate) -> Self {
        let snapshot = update.snapshot;
        Self {
            tick: update.tick,
            stage_state: snapshot.stage_state,
            camera_x: snapshot.camera_x,
            pawn: PawnDto::from(&snapshot.pawn),
            projectiles: snapshot.projectiles.iter().map(ProjectileDto::from).collect(),
            player: update.player_delta,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PawnDto {
    pub x: f64,
    pub y: f32,
    pub rot: f32,
    pub alive: bool,
}

impl From<&PawnSnapshot> for PawnDto {
    fn from(pawn: &PawnSnapshot) -> Self {
        Self {
            x: pawn.x,
            y: pawn.y,
            rot: pawn.rotation,
            alive: pawn.alive,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileDto {
    pub id: String,
    pub cannon: Cannon,
    pub x: f64,
    pub y: f32,
}

impl From<&ProjectileSnapshot> for ProjectileDto {
    fn from(projectile: &ProjectileSnapshot) -> Self {
        Self {
            id: projectile.id.to_string(),
            cannon: projectile.cannon,
            x: projectile.x,
            y: projectile.y,
        }
    }
}

/// Session lifecycle sent to clients for UI flow.
#[derive(Debug, Clone, Serialize)]
pub enum SessionStateDto {
    Preparing,
    Playing,
    GameOver,
    Exited,
}

impl From<SessionState> for SessionStateDto {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::Preparing => SessionStateDto::Preparing,
            SessionState::Playing => SessionStateDto::Playing,
            SessionState::GameOver => SessionStateDto::GameOver,
            SessionState::Exited => SessionStateDto::Exited,
        }
    }
}
