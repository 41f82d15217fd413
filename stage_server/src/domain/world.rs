// Stage world: the pilot's ship, the scrolling camera and the stage flow.

use super::arena::{Arena, EntityId};
use super::player::{PlayerState, PlayerStatus};
use super::power_up::{FireOutcome, FireTrigger};
use super::projection::{self, CameraView, Viewport};
use super::replication::PlayerReplica;
use super::stage::{StageState, StageStateMachine};
use super::systems::movement::MovementModel;
use super::systems::weapons::{self, Cannon, Projectile};
use super::timers::{StageTimer, StageTimers};
use super::tuning::StageSettings;
use super::tuning::camera::CameraTuning;
use glam::{Vec2, Vec3};
use tracing::{debug, info, warn};

/// Anything advanced once per simulation tick.
pub trait Tickable {
    fn update(&mut self, dt: f32);
}

/// Side-view camera that scrolls the stage along +x at a constant speed.
///
/// The simulation runs in the camera's frame: the camera sits at the local
/// origin and only the distance travelled along the stage is tracked, in
/// `f64`, so positions keep their precision on long stages.
#[derive(Debug, Clone)]
pub struct ScrollingCamera {
    tuning: CameraTuning,
    travelled: f64,
}

impl ScrollingCamera {
    pub fn new(tuning: CameraTuning) -> Self {
        Self {
            tuning,
            travelled: 0.0,
        }
    }

    /// Stage x of the camera.
    pub fn travelled(&self) -> f64 {
        self.travelled
    }

    /// Frame velocity of the camera along the stage.
    pub fn velocity(&self) -> Vec2 {
        Vec2::new(self.tuning.scroll_speed, 0.0)
    }

    pub fn view(&self) -> CameraView {
        CameraView {
            position: Vec3::new(0.0, 0.0, self.tuning.distance),
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
            fov_degrees: self.tuning.fov_degrees,
            aspect_ratio: self.tuning.aspect_ratio,
        }
    }
}

impl Tickable for ScrollingCamera {
    fn update(&mut self, dt: f32) {
        self.travelled += f64::from(self.tuning.scroll_speed) * f64::from(dt);
    }
}

/// Axis intensities for one tick of pilot input. Zero means not held.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PilotInput {
    pub up: f32,
    pub down: f32,
    pub left: f32,
    pub right: f32,
}

/// Overlap reported by the physics service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    /// The ship touched an enemy, a bullet or the scenery.
    Hazard,
    FuelCapsule,
    /// One of the ship's projectiles destroyed an enemy.
    EnemyDestroyed { points: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PawnSnapshot {
    pub x: f64,
    pub y: f32,
    pub rotation: f32,
    pub alive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileSnapshot {
    pub id: u64,
    pub cannon: Cannon,
    pub x: f64,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorldSnapshot {
    pub stage_state: StageState,
    pub camera_x: f64,
    pub pawn: PawnSnapshot,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub player: PlayerReplica,
}

/// Single-pilot stage simulation, advanced by [`Tickable::update`].
///
/// Stage flow: Preparing until the prepare timer fires, Playing until the
/// ship is destroyed, then Preparing again (respawn) or GameOver when no
/// lives remain. GameOver arms the exit timer; once it fires the world is
/// finished and ignores further ticks.
#[derive(Debug, Clone)]
pub struct StageWorld {
    settings: StageSettings,
    stage: StageStateMachine,
    player: PlayerStatus,
    movement: MovementModel,
    trigger: FireTrigger,
    timers: StageTimers,
    camera: ScrollingCamera,
    // Relative to the camera.
    pawn_position: Vec2,
    next_cannon: Cannon,
    projectiles: Arena<Projectile>,
    viewport: Option<Viewport>,
    clock: f64,
    finished: bool,
}

impl StageWorld {
    pub fn new(settings: StageSettings) -> Self {
        let mut timers = StageTimers::new();
        timers.arm(StageTimer::Prepare, settings.stage.preparing_delay);

        Self {
            settings,
            stage: StageStateMachine::new(),
            player: PlayerStatus::new(settings.player.initial_lives),
            movement: MovementModel::new(settings.movement),
            trigger: FireTrigger::new(settings.player.activation_hold),
            timers,
            camera: ScrollingCamera::new(settings.camera),
            pawn_position: Vec2::ZERO,
            next_cannon: Cannon::default(),
            projectiles: Arena::new(),
            viewport: None,
            clock: 0.0,
            finished: false,
        }
    }

    pub fn stage_state(&self) -> StageState {
        self.stage.current_state()
    }

    pub fn player(&self) -> &PlayerStatus {
        &self.player
    }

    pub fn movement(&self) -> &MovementModel {
        &self.movement
    }

    pub fn camera(&self) -> &ScrollingCamera {
        &self.camera
    }

    /// Ship position relative to the camera.
    pub fn pawn_position(&self) -> Vec2 {
        self.pawn_position
    }

    pub fn projectiles(&self) -> &Arena<Projectile> {
        &self.projectiles
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Stage time in seconds (sum of tick deltas).
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// True once the game-over screen has timed out.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn is_piloting(&self) -> bool {
        self.stage.current_state() == StageState::Playing
            && self.player.current_state() == PlayerState::Playing
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport.is_empty() {
            warn!(
                width = viewport.width,
                height = viewport.height,
                "ignoring empty viewport"
            );
            return;
        }
        self.viewport = Some(viewport);
    }

    pub fn apply_input(&mut self, input: PilotInput) {
        if !self.is_piloting() {
            return;
        }
        self.movement.move_up(input.up);
        self.movement.move_down(input.down);
        self.movement.move_left(input.left);
        self.movement.move_right(input.right);
    }

    pub fn fire_pressed(&mut self) {
        if self.is_piloting() {
            self.trigger.press(self.clock);
        }
    }

    pub fn fire_released(&mut self) {
        match self.trigger.release(self.clock) {
            FireOutcome::Fire => {
                self.fire();
            }
            FireOutcome::Disarm => self.player.set_activation_mode(false),
            FireOutcome::Ignored => {}
        }
    }

    /// Forgets a held fire button and leaves activation mode, e.g. when the
    /// pilot disconnects mid-press.
    pub fn release_controls(&mut self) {
        self.trigger.reset();
        self.player.set_activation_mode(false);
    }

    /// Shoots the next cannon. Returns `None` while the ship cannot fire.
    ///
    /// Shots need a reported viewport; without one they could never be
    /// culled.
    pub fn fire(&mut self) -> Option<EntityId> {
        if !self.is_piloting() {
            return None;
        }
        if self.viewport.is_none() {
            debug!("fire ignored until a viewport is reported");
            return None;
        }
        Some(weapons::fire(
            &mut self.projectiles,
            &mut self.next_cannon,
            self.pawn_position,
            &self.settings.weapons,
        ))
    }

    pub fn handle_collision(&mut self, collision: Collision) {
        match collision {
            Collision::Hazard => {
                if self.is_piloting() {
                    self.destroy_player();
                } else {
                    debug!(stage = ?self.stage_state(), "hazard ignored outside play");
                }
            }
            Collision::FuelCapsule => {
                if self.is_piloting() {
                    self.player.fuel_capsule_collected();
                }
            }
            Collision::EnemyDestroyed { points } => self.player.add_score(points),
        }
    }

    fn destroy_player(&mut self) {
        if !self.player.set_state(PlayerState::Destroyed) {
            return;
        }
        self.trigger.reset();
        self.movement.reset();
        self.projectiles.clear();

        let lives = self.player.lives();
        info!(lives, "player destroyed");
        if lives > 0 {
            self.enter_preparing(self.settings.stage.respawn_delay);
        } else {
            self.enter_game_over();
        }
    }

    fn enter_preparing(&mut self, delay: f32) {
        if self.stage.set_state(StageState::Preparing) {
            self.timers.cancel_all();
            self.timers.arm(StageTimer::Prepare, delay);
        }
    }

    fn enter_playing(&mut self) {
        if self.stage.set_state(StageState::Playing) {
            self.timers.cancel_all();
        }
    }

    fn enter_game_over(&mut self) {
        if self.stage.set_state(StageState::GameOver) {
            self.timers.cancel_all();
            self.timers
                .arm(StageTimer::GameOverExit, self.settings.stage.game_over_delay);
        }
    }

    fn on_timer(&mut self, timer: StageTimer) {
        match timer {
            StageTimer::Prepare => {
                if self.player.current_state() == PlayerState::Destroyed {
                    self.player.restart();
                }
                self.pawn_position = Vec2::ZERO;
                self.movement.reset();
                self.projectiles.clear();
                self.enter_playing();
            }
            StageTimer::GameOverExit => {
                info!(score = self.player.game_score(), "stage finished");
                self.finished = true;
            }
        }
    }

    fn move_pawn(&mut self, dt: f32) {
        // No viewport reported yet: the ship holds still.
        let Some(viewport) = self.viewport else {
            return;
        };

        let bounds = projection::viewport_bounds(&self.camera.view(), viewport)
            .inspect_err(|e| debug!(error = ?e, "viewport bounds unavailable"))
            .ok();
        self.pawn_position = self.movement.tick(
            self.pawn_position,
            dt,
            self.player.speed_up_level(),
            Vec2::from(self.settings.player.extent),
            bounds.as_ref(),
        );
    }

    fn update_projectiles(&mut self, dt: f32) {
        weapons::advance(&mut self.projectiles, dt, self.camera.velocity());

        let Some(viewport) = self.viewport else {
            return;
        };
        match weapons::despawn_invisible(&mut self.projectiles, &self.camera.view(), viewport) {
            Ok(0) => {}
            Ok(removed) => debug!(removed, "projectiles left the screen"),
            Err(e) => debug!(error = ?e, "projectile visibility skipped"),
        }
    }

    fn stage_x(&self, local_x: f32) -> f64 {
        self.camera.travelled() + f64::from(local_x)
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            stage_state: self.stage_state(),
            camera_x: self.camera.travelled(),
            pawn: PawnSnapshot {
                x: self.stage_x(self.pawn_position.x),
                y: self.pawn_position.y,
                rotation: self.movement.current_rotation(),
                alive: self.player.current_state() == PlayerState::Playing,
            },
            projectiles: self
                .projectiles
                .iter()
                .map(|(id, p)| ProjectileSnapshot {
                    id: id.to_bits(),
                    cannon: p.cannon,
                    x: self.stage_x(p.position.x),
                    y: p.position.y,
                })
                .collect(),
            player: PlayerReplica::from(&self.player),
        }
    }
}

impl Tickable for StageWorld {
    fn update(&mut self, dt: f32) {
        if self.finished {
            return;
        }
        self.clock += f64::from(dt);

        for timer in self.timers.advance(dt) {
            self.on_timer(timer);
        }
        if self.finished {
            return;
        }

        if self.is_piloting() && self.trigger.update(self.clock) {
            self.player.set_activation_mode(true);
        }

        // The ship rides along in the camera frame.
        self.camera.update(dt);

        if self.is_piloting() {
            self.move_pawn(dt);
        }
        self.update_projectiles(dt);

        if self.player.lives() == 0 && self.stage_state() != StageState::GameOver {
            self.enter_game_over();
        }
    }
}
