use crate::domain::PilotInput;
use crate::domain::projection::Viewport;
use crate::interface_adapters::http::error_response;
use crate::interface_adapters::protocol::{ClientMessage, Role, ServerMessage, WorldUpdateDto};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::next_connection_id;
use crate::use_cases::{
    GameEvent, RegistryError, SessionState, StageHandle, StageRegistry, WorldUpdate,
};

use axum::{
    Error,
    extract::{
        Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::timeout;
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    InputClosed,
    WorldUpdatesClosed,
    SessionStateClosed,
    JoinRequired,
    JoinTimeout,
    ClosedBeforeJoin,
    StageExited,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct StageQuery {
    // The stage the client wants to join; the default stage when absent.
    #[serde(default)]
    stage_id: Option<String>,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const MAX_DISPLAY_NAME_LEN: usize = 32;
const MAX_VIEWPORT_SIDE: f32 = 16_384.0;
const JOIN_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn world_update_serializer(
    mut world_rx: broadcast::Receiver<WorldUpdate>,
    world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    world_latest_tx: watch::Sender<Utf8Bytes>,
) {
    // Deltas skipped while lagging must be replaced by a full snapshot.
    let mut resync = false;
    let mut have_snapshot = false;

    loop {
        match world_rx.recv().await {
            Ok(update) => {
                if update.player_delta.is_some() || !have_snapshot || resync {
                    let msg = ServerMessage::PlayerSnapshot(update.snapshot.player.clone());
                    match serde_json::to_string(&msg) {
                        Ok(txt) => {
                            let bytes = Utf8Bytes::from(txt);
                            // Latest full snapshot for joins and lag recovery.
                            let _ = world_latest_tx.send(bytes.clone());
                            if resync {
                                let _ = world_bytes_tx.send(bytes);
                                resync = false;
                            }
                            have_snapshot = true;
                        }
                        Err(e) => error!(error = ?e, "failed to serialize player snapshot"),
                    }
                }

                let msg = ServerMessage::WorldUpdate(WorldUpdateDto::from(update));
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize world update");
                        continue;
                    }
                };

                // Convert once and broadcast shared UTF-8 bytes to all clients.
                let _ = world_bytes_tx.send(Utf8Bytes::from(txt));
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    missed = n,
                    "world serializer lagged; resending the player snapshot"
                );
                resync = true;
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("world updates channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_stage_serializer(stage: &StageHandle) {
    tokio::spawn(world_update_serializer(
        stage.world_tx.subscribe(),
        stage.world_bytes_tx.clone(),
        stage.world_latest_tx.clone(),
    ));
}

/// Creates a stage together with its serializer and exit watcher.
pub async fn launch_stage(
    registry: &Arc<StageRegistry>,
    stage_id: String,
) -> Result<StageHandle, RegistryError> {
    let stage = registry.create_stage(stage_id).await?;
    // Create serializers so clients can subscribe immediately.
    spawn_stage_serializer(&stage);
    registry.clone().spawn_exit_watcher(&stage);
    Ok(stage)
}

// The default stage is recreated after its previous session exited.
async fn default_stage(state: &AppState) -> Option<StageHandle> {
    let registry = &state.stage_registry;
    if let Some(stage) = registry.get_stage(&state.default_stage_id).await {
        return Some(stage);
    }
    match launch_stage(registry, state.default_stage_id.to_string()).await {
        Ok(stage) => Some(stage),
        // Another connection won the race.
        Err(RegistryError::AlreadyExists) => registry.get_stage(&state.default_stage_id).await,
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<StageQuery>,
) -> impl IntoResponse {
    let stage = match query.stage_id {
        Some(stage_id) => state.stage_registry.get_stage(&stage_id).await,
        None => default_stage(&state).await,
    };

    let Some(stage) = stage else {
        // Keep not-found responses consistent with the JSON error schema.
        return error_response(StatusCode::NOT_FOUND, "stage not found");
    };

    ws.on_upgrade(move |socket| handle_socket(socket, stage))
}

async fn handle_socket(socket: WebSocket, stage: StageHandle) {
    // Connection ids double as player ids; there is no account system.
    let conn_id = next_connection_id();
    let span = info_span!("conn", conn_id, stage_id = %stage.stage_id);
    serve_connection(socket, stage, conn_id)
        .instrument(span)
        .await;
}

async fn serve_connection(mut socket: WebSocket, stage: StageHandle, conn_id: u64) {
    let mut ctx = match bootstrap_connection(&mut socket, &stage, conn_id).await {
        Ok(ctx) => ctx,
        Err(NetError::ClosedBeforeJoin) => {
            info!("client disconnected before join handshake");
            return;
        }
        Err(NetError::StageExited) => {
            info!("client joined a stage that already exited");
            return;
        }
        Err(e) => {
            error!(error = ?e, "failed to bootstrap connection");
            let _ = send_close_with_reason(&mut socket, close_code::POLICY, "bootstrap failed").await;
            return;
        }
    };

    info!(
        player_id = ctx.player_id,
        display_name = %ctx.display_name,
        role = ?ctx.role,
        "client connected"
    );

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

#[derive(Debug, Default)]
struct ConnStats {
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    // Lag recovery snapshots sent to this client.
    lag_recovery_count: u64,
}

impl ConnStats {
    fn record_out(&mut self, bytes: usize) {
        self.msgs_out += 1;
        self.bytes_out += bytes as u64;
    }
}

struct LogThrottle {
    input_full: Instant,
    world_lag: Instant,
    invalid_input: Instant,
}

impl LogThrottle {
    fn new() -> Self {
        let now = Instant::now()
            .checked_sub(LOG_THROTTLE)
            .unwrap_or_else(Instant::now);
        Self {
            input_full: now,
            world_lag: now,
            invalid_input: now,
        }
    }
}

struct ConnCtx {
    player_id: u64,
    display_name: String,
    role: Role,
    // Stage handle for pilot release on disconnect.
    stage: StageHandle,
    input_tx: mpsc::Sender<GameEvent>,
    world_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    world_latest_rx: watch::Receiver<Utf8Bytes>,
    session_rx: watch::Receiver<SessionState>,
    stats: ConnStats,
    throttle: LogThrottle,
    close_frame: Option<CloseFrame>,
}

#[derive(Debug)]
struct JoinHandshake {
    display_name: String,
    bytes_in: u64,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    stage: &StageHandle,
    player_id: u64,
) -> Result<ConnCtx, NetError> {
    // Subscribe to updates *before* doing anything else (awaits) to not miss packets.
    let world_bytes_rx = stage.world_bytes_tx.subscribe();
    let world_latest_rx = stage.world_latest_tx.subscribe();
    let session_rx = stage.session_tx.subscribe();

    let join = match timeout(JOIN_HANDSHAKE_TIMEOUT, read_join_handshake(socket)).await {
        Ok(result) => result?,
        Err(_) => {
            let _ = send_close_with_reason(socket, close_code::POLICY, "join timeout").await;
            return Err(NetError::JoinTimeout);
        }
    };

    // First connection flies the ship; everyone else watches.
    let role = if stage.claim_pilot(player_id).await {
        Role::Pilot
    } else {
        Role::Spectator
    };

    let mut stats = ConnStats {
        msgs_in: 1,
        bytes_in: join.bytes_in,
        ..ConnStats::default()
    };

    let identity_msg = ServerMessage::Identity {
        player_id: player_id.to_string(),
        role,
    };
    let sent = send_message(socket, &identity_msg).await;
    let bytes = match sent {
        Ok(bytes) => bytes,
        Err(err) => {
            // Ensure the controls are freed if we fail the handshake early.
            stage.release_pilot(player_id).await;
            return Err(err);
        }
    };
    stats.record_out(bytes);

    if role == Role::Pilot
        && stage
            .input_tx
            .send(GameEvent::Join { player_id })
            .await
            .is_err()
    {
        stage.release_pilot(player_id).await;
        return Err(NetError::InputClosed);
    }

    // Clone as soon as we borrow to avoid holding the lock across an await.
    let initial_state = *session_rx.borrow();
    let latest_snapshot = world_latest_rx.borrow().clone();

    let mut initial: Vec<Utf8Bytes> = Vec::with_capacity(2);
    let state_msg = ServerMessage::StageState(initial_state.into());
    match serde_json::to_string(&state_msg) {
        Ok(txt) => initial.push(Utf8Bytes::from(txt)),
        Err(e) => {
            cleanup_pilot(stage, role, player_id).await;
            return Err(NetError::Serialization(e));
        }
    }
    if !latest_snapshot.is_empty() {
        initial.push(latest_snapshot);
    }

    for bytes in initial {
        let len = bytes.len();
        if let Err(e) = socket.send(Message::Text(bytes)).await {
            cleanup_pilot(stage, role, player_id).await;
            return Err(NetError::Ws(e));
        }
        stats.record_out(len);
    }

    if initial_state == SessionState::Exited {
        cleanup_pilot(stage, role, player_id).await;
        let _ = send_close_with_reason(socket, close_code::NORMAL, "stage finished").await;
        return Err(NetError::StageExited);
    }

    Ok(ConnCtx {
        player_id,
        display_name: join.display_name,
        role,
        stage: stage.clone(),
        input_tx: stage.input_tx.clone(),
        world_bytes_rx,
        world_latest_rx,
        session_rx,
        stats,
        throttle: LogThrottle::new(),
        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

fn sanitize_display_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "pilot".to_string();
    }
    trimmed.chars().take(MAX_DISPLAY_NAME_LEN).collect()
}

async fn read_join_handshake(socket: &mut WebSocket) -> Result<JoinHandshake, NetError> {
    loop {
        let Some(incoming) = socket.recv().await else {
            return Err(NetError::ClosedBeforeJoin);
        };

        let message = incoming.map_err(NetError::Ws)?;
        match message {
            Message::Text(text) => {
                let bytes_in = text.len() as u64;
                return match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join(payload)) => Ok(JoinHandshake {
                        display_name: sanitize_display_name(&payload.display_name),
                        bytes_in,
                    }),
                    Ok(_) => {
                        let _ = send_close_with_reason(socket, close_code::POLICY, "join required")
                            .await;
                        Err(NetError::JoinRequired)
                    }
                    Err(_) => {
                        let _ = send_close_with_reason(
                            socket,
                            close_code::POLICY,
                            "invalid join payload",
                        )
                        .await;
                        Err(NetError::JoinRequired)
                    }
                };
            }
            Message::Binary(_) => {
                let _ = send_close_with_reason(
                    socket,
                    close_code::UNSUPPORTED,
                    "binary messages not supported",
                )
                .await;
                return Err(NetError::JoinRequired);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforeJoin),
        }
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

fn sanitize_input(input: PilotInput) -> Option<PilotInput> {
    let axes = [input.up, input.down, input.left, input.right];
    if axes.iter().any(|v| !v.is_finite()) {
        return None;
    }

    Some(PilotInput {
        up: input.up.clamp(-1.0, 1.0),
        down: input.down.clamp(-1.0, 1.0),
        left: input.left.clamp(-1.0, 1.0),
        right: input.right.clamp(-1.0, 1.0),
    })
}

fn sanitize_viewport(viewport: Viewport) -> Option<Viewport> {
    let valid = |side: f32| side.is_finite() && side > 0.0 && side <= MAX_VIEWPORT_SIDE;
    (valid(viewport.width) && valid(viewport.height)).then_some(viewport)
}

// Axis input is resent every tick and may be dropped while the world is busy.
// Button edges and viewport changes happen once and must reach the world.
async fn forward_event(
    player_id: u64,
    input_tx: &mpsc::Sender<GameEvent>,
    event: GameEvent,
    last_input_full_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    if !matches!(event, GameEvent::Input { .. }) {
        return match input_tx.send(event).await {
            Ok(()) => Ok(LoopControl::Continue),
            Err(_) => Err(NetError::InputClosed),
        };
    }

    match input_tx.try_send(event) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_evt)) => {
            if should_log(last_input_full_log) {
                warn!(player_id, "input channel full; dropping input");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_evt)) => Err(NetError::InputClosed),
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;
    let role = ctx.role;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        stage,
        input_tx,
        world_bytes_rx,
        world_latest_rx,
        session_rx,
        stats,
        throttle,
        close_frame,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    incoming,
                    player_id,
                    role,
                    input_tx,
                    stats,
                    throttle,
                    close_frame,
                )
                .await
                {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            world_msg = world_bytes_rx.recv() => {
                match world_msg {
                    Ok(bytes) => match forward_world_bytes(bytes, socket, stats).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(&mut throttle.world_lag) {
                            warn!(missed = n, "world updates lagged; sending player snapshot");
                        }

                        // Resync strategy: the next world update carries fresh positions,
                        // only the delta-encoded player replica needs a full copy.
                        let latest = world_latest_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            stats.lag_recovery_count += 1;
                            debug!(
                                player_id,
                                count = stats.lag_recovery_count,
                                "sending lag recovery snapshot"
                            );
                            match forward_world_bytes(latest, socket, stats).await {
                                LoopControl::Continue => false,
                                LoopControl::Disconnect => true,
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::WorldUpdatesClosed);
                        true
                    }
                }
            }

            changed_state = session_rx.changed() => {
                match changed_state {
                    Ok(()) => {
                        let state = *session_rx.borrow_and_update();
                        match forward_session_state(state, socket, stats).await {
                            LoopControl::Disconnect => true,
                            LoopControl::Continue if state == SessionState::Exited => {
                                *close_frame = Some(CloseFrame {
                                    code: close_code::NORMAL,
                                    reason: "stage finished".into(),
                                });
                                true
                            }
                            LoopControl::Continue => false,
                        }
                    }
                    Err(_) => {
                        warn!(player_id, "session state channel closed; disconnecting");
                        fatal = Some(NetError::SessionStateClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    disconnect_cleanup(player_id, role, stage, stats).await;

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

async fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    player_id: u64,
    role: Role,
    input_tx: &mpsc::Sender<GameEvent>,
    stats: &mut ConnStats,
    throttle: &mut LogThrottle,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    let text = match incoming {
        Some(Ok(Message::Text(text))) => text,
        Some(Ok(Message::Binary(_))) => {
            *close_frame = Some(CloseFrame {
                code: close_code::UNSUPPORTED,
                reason: "binary messages not supported".into(),
            });
            return Ok(LoopControl::Disconnect);
        }
        Some(Ok(Message::Ping(_) | Message::Pong(_))) => return Ok(LoopControl::Continue),
        Some(Ok(Message::Close(_))) => return Ok(LoopControl::Disconnect),
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            return Ok(LoopControl::Disconnect);
        }
        None => {
            info!(player_id, "websocket closed");
            return Ok(LoopControl::Disconnect);
        }
    };

    stats.msgs_in += 1;
    stats.bytes_in += text.len() as u64;

    let msg = match serde_json::from_str::<ClientMessage>(&text) {
        Ok(msg) => msg,
        Err(parse_err) => {
            stats.invalid_json += 1;
            if should_log(&mut throttle.invalid_input) {
                warn!(
                    player_id,
                    bytes = text.len(),
                    error = %parse_err,
                    "failed to parse client message"
                );
            }
            if stats.invalid_json > MAX_INVALID_JSON {
                *close_frame = Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: "too many invalid messages".into(),
                });
                return Ok(LoopControl::Disconnect);
            }
            return Ok(LoopControl::Continue);
        }
    };

    if let ClientMessage::Join(_) = msg {
        // Ignore repeated Join packets after bootstrap to keep the session stable.
        if should_log(&mut throttle.invalid_input) {
            warn!(player_id, "duplicate join ignored");
        }
        return Ok(LoopControl::Continue);
    }

    if role != Role::Pilot {
        // Spectators cannot fly the ship.
        if should_log(&mut throttle.invalid_input) {
            warn!(player_id, "spectator input ignored");
        }
        return Ok(LoopControl::Continue);
    }

    let event = match msg {
        ClientMessage::Input(input) => match sanitize_input(input.into()) {
            Some(input) => GameEvent::Input { player_id, input },
            None => {
                if should_log(&mut throttle.invalid_input) {
                    warn!(player_id, "invalid input values (NaN/inf); dropping");
                }
                return Ok(LoopControl::Continue);
            }
        },
        ClientMessage::FirePressed => GameEvent::FirePressed { player_id },
        ClientMessage::FireReleased => GameEvent::FireReleased { player_id },
        ClientMessage::Viewport(viewport) => match sanitize_viewport(viewport.into()) {
            Some(viewport) => GameEvent::Viewport {
                player_id,
                viewport,
            },
            None => {
                if should_log(&mut throttle.invalid_input) {
                    warn!(player_id, "invalid viewport size; dropping");
                }
                return Ok(LoopControl::Continue);
            }
        },
        ClientMessage::Join(_) => return Ok(LoopControl::Continue),
    };

    forward_event(player_id, input_tx, event, &mut throttle.input_full).await
}

async fn forward_world_bytes(
    world_msg: Utf8Bytes,
    socket: &mut WebSocket,
    stats: &mut ConnStats,
) -> LoopControl {
    let bytes_len = world_msg.len();
    match socket
        .send(Message::Text(world_msg))
        .await
        .map_err(NetError::Ws)
    {
        Ok(()) => {
            stats.record_out(bytes_len);
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send world update");
            LoopControl::Disconnect
        }
    }
}

async fn forward_session_state(
    state: SessionState,
    socket: &mut WebSocket,
    stats: &mut ConnStats,
) -> LoopControl {
    let msg = ServerMessage::StageState(state.into());
    match send_message(socket, &msg).await {
        Ok(bytes) => {
            stats.record_out(bytes);
            LoopControl::Continue
        }
        Err(err) => {
            warn!(error = ?err, "failed to send stage state");
            LoopControl::Disconnect
        }
    }
}

async fn cleanup_pilot(stage: &StageHandle, role: Role, player_id: u64) {
    if role != Role::Pilot {
        return;
    }
    // The world may already have stopped; nothing left to notify then.
    if stage
        .input_tx
        .send(GameEvent::Leave { player_id })
        .await
        .is_err()
    {
        debug!(player_id, "stage stopped before pilot leave");
    }
    stage.release_pilot(player_id).await;
}

async fn disconnect_cleanup(player_id: u64, role: Role, stage: &StageHandle, stats: &ConnStats) {
    cleanup_pilot(stage, role, player_id).await;

    debug!(
        player_id,
        msgs_in = stats.msgs_in,
        msgs_out = stats.msgs_out,
        bytes_in = stats.bytes_in,
        bytes_out = stats.bytes_out,
        invalid_json = stats.invalid_json,
        lag_recovery_count = stats.lag_recovery_count,
        "connection stats"
    );
    info!(player_id, "client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_input_is_dropped_and_the_rest_clamped() {
        let bad = PilotInput {
            up: f32::NAN,
            ..PilotInput::default()
        };
        assert_eq!(sanitize_input(bad), None);

        let loud = PilotInput {
            up: 3.0,
            left: -2.0,
            ..PilotInput::default()
        };
        let clean = sanitize_input(loud).unwrap();
        assert_eq!(clean.up, 1.0);
        assert_eq!(clean.left, -1.0);
    }

    #[test]
    fn viewport_sides_must_be_positive_and_bounded() {
        assert!(sanitize_viewport(Viewport::new(1920.0, 1080.0)).is_some());
        assert!(sanitize_viewport(Viewport::new(0.0, 1080.0)).is_none());
        assert!(sanitize_viewport(Viewport::new(1920.0, f32::INFINITY)).is_none());
        assert!(sanitize_viewport(Viewport::new(100_000.0, 1080.0)).is_none());
    }

    #[tokio::test]
    async fn fire_release_waits_for_room_in_a_full_channel() {
        let (tx, mut rx) = mpsc::channel(1);
        tx.try_send(GameEvent::Input {
            player_id: 1,
            input: PilotInput::default(),
        })
        .unwrap();

        let mut last_log = Instant::now();
        let release = forward_event(1, &tx, GameEvent::FireReleased { player_id: 1 }, &mut last_log);
        let (sent, first) = tokio::join!(release, rx.recv());

        assert!(matches!(sent, Ok(LoopControl::Continue)));
        assert!(matches!(first, Some(GameEvent::Input { .. })));
        assert!(matches!(
            rx.recv().await,
            Some(GameEvent::FireReleased { player_id: 1 })
        ));
    }

    #[tokio::test]
    async fn axis_input_is_dropped_when_the_channel_is_full() {
        let (tx, mut rx) = mpsc::channel(1);
        tx.try_send(GameEvent::FirePressed { player_id: 1 }).unwrap();

        let mut last_log = Instant::now();
        let input = GameEvent::Input {
            player_id: 1,
            input: PilotInput::default(),
        };
        let sent = forward_event(1, &tx, input, &mut last_log).await;

        assert!(matches!(sent, Ok(LoopControl::Continue)));
        assert!(matches!(rx.recv().await, Some(GameEvent::FirePressed { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_world_ends_the_connection() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let mut last_log = Instant::now();
        let sent = forward_event(1, &tx, GameEvent::FirePressed { player_id: 1 }, &mut last_log).await;
        assert!(matches!(sent, Err(NetError::InputClosed)));
    }

    #[test]
    fn display_names_are_trimmed_and_capped() {
        assert_eq!(sanitize_display_name("  Ace  "), "Ace");
        assert_eq!(sanitize_display_name("   "), "pilot");
        assert_eq!(sanitize_display_name(&"x".repeat(100)).len(), MAX_DISPLAY_NAME_LEN);
    }
}
