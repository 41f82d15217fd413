use super::types::{GameEvent, SessionState, WorldUpdate};
use crate::domain::replication::PlayerReplica;
use crate::domain::tuning::StageSettings;
use crate::domain::{StageWorld, Tickable};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc, watch};
use tracing::{debug, info};

/// Authoritative loop for one stage.
///
/// Owns the [`StageWorld`], drains queued events at the start of every tick,
/// advances the world by the fixed tick interval and publishes the result.
/// Returns once the world finishes or `shutdown` is notified, publishing
/// `Exited` in both cases.
pub async fn world_task(
    mut input_rx: mpsc::Receiver<GameEvent>,
    world_tx: broadcast::Sender<WorldUpdate>,
    session_tx: watch::Sender<SessionState>,
    tick_interval: Duration,
    settings: StageSettings,
    shutdown: Arc<Notify>,
) {
    let mut world = StageWorld::new(settings);
    let mut tick: u64 = 0;
    let mut pilot: Option<u64> = None;
    let mut last_replica: Option<PlayerReplica> = None;
    let dt = tick_interval.as_secs_f32();

    publish_session_state(&session_tx, world.stage_state().into());

    // Drive the fixed-step stage loop at the configured tick rate.
    let mut interval = tokio::time::interval(tick_interval);

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                info!("stage shut down");
                // Connected clients and the exit watcher key off this.
                let _ = session_tx.send(SessionState::Exited);
                break;
            }
            _ = interval.tick() => {}
        }

        while let Ok(ev) = input_rx.try_recv() {
            apply_event(&mut world, &mut pilot, ev);
        }

        world.update(dt);

        if world.is_finished() {
            info!(tick, score = world.player().game_score(), "stage exited");
            let _ = session_tx.send(SessionState::Exited);
            break;
        }
        publish_session_state(&session_tx, world.stage_state().into());

        tick += 1;
        let snapshot = world.snapshot();
        let player_delta = last_replica
            .as_ref()
            .and_then(|previous| previous.diff(&snapshot.player));
        last_replica = Some(snapshot.player.clone());

        let _ = world_tx.send(WorldUpdate {
            tick,
            snapshot,
            player_delta,
        });
    }
}

fn publish_session_state(session_tx: &watch::Sender<SessionState>, state: SessionState) {
    session_tx.send_if_modified(|current| {
        if *current == state {
            false
        } else {
            *current = state;
            true
        }
    });
}

fn apply_event(world: &mut StageWorld, pilot: &mut Option<u64>, ev: GameEvent) {
    match ev {
        GameEvent::Join { player_id } => {
            info!(player_id, "pilot joined");
            *pilot = Some(player_id);
        }
        GameEvent::Leave { player_id } => {
            if *pilot == Some(player_id) {
                info!(player_id, "pilot left");
                *pilot = None;
                world.release_controls();
            }
        }
        GameEvent::Input { player_id, input } => {
            if is_pilot(pilot, player_id) {
                world.apply_input(input);
            }
        }
        GameEvent::FirePressed { player_id } => {
            if is_pilot(pilot, player_id) {
                world.fire_pressed();
            }
        }
        GameEvent::FireReleased { player_id } => {
            if is_pilot(pilot, player_id) {
                world.fire_released();
            }
        }
        GameEvent::Viewport { player_id, viewport } => {
            if is_pilot(pilot, player_id) {
                world.set_viewport(viewport);
            }
        }
        GameEvent::Collision(collision) => {
            debug!(?collision, "collision reported");
            world.handle_collision(collision);
        }
    }
}

fn is_pilot(pilot: &Option<u64>, player_id: u64) -> bool {
    *pilot == Some(player_id)
}
