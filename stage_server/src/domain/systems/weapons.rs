use crate::domain::arena::{Arena, EntityId};
use crate::domain::projection::{self, CameraView, ProjectionError, Viewport};
use crate::domain::tuning::weapons::WeaponTuning;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The ship's three cannons, fired in rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cannon {
    #[default]
    Right,
    Left,
    Top,
}

impl Cannon {
    pub fn next(self) -> Cannon {
        match self {
            Cannon::Right => Cannon::Left,
            Cannon::Left => Cannon::Top,
            Cannon::Top => Cannon::Right,
        }
    }

    fn slot(self) -> usize {
        match self {
            Cannon::Right => 0,
            Cannon::Left => 1,
            Cannon::Top => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub cannon: Cannon,
    pub position: Vec2,
    pub velocity: Vec2,
    pub extent: Vec2,
}

/// Spawns a projectile from the next cannon in the rotation.
pub fn fire(
    projectiles: &mut Arena<Projectile>,
    next_cannon: &mut Cannon,
    ship_position: Vec2,
    tuning: &WeaponTuning,
) -> EntityId {
    let cannon = *next_cannon;
    let offset = Vec2::from(tuning.cannon_offsets[cannon.slot()]);
    let id = projectiles.insert(Projectile {
        cannon,
        position: ship_position + offset,
        velocity: Vec2::new(tuning.projectile_speed, 0.0),
        extent: Vec2::from(tuning.projectile_extent),
    });
    *next_cannon = cannon.next();
    debug!(projectile_id = id.to_bits(), ?cannon, "projectile spawned");
    id
}

/// Moves projectiles within a frame that itself moves at `frame_velocity`.
pub fn advance(projectiles: &mut Arena<Projectile>, dt: f32, frame_velocity: Vec2) {
    for p in projectiles.values_mut() {
        p.position += (p.velocity - frame_velocity) * dt;
    }
}

/// Drops projectiles whose on-screen box is entirely outside the viewport.
///
/// Returns how many were dropped. Projection failures leave the arena as is.
pub fn despawn_invisible(
    projectiles: &mut Arena<Projectile>,
    camera: &CameraView,
    viewport: Viewport,
) -> Result<usize, ProjectionError> {
    // Validate once so a broken camera cannot drop everything.
    projection::viewport_bounds(camera, viewport)?;

    let removed = projectiles.retain(|_, p| {
        let center = p.position.extend(0.0);
        let extent = p.extent.extend(0.0);
        let screen = projection::world_to_screen(camera, viewport, center).ok().flatten();
        let size = projection::size_in_screen(camera, viewport, center, extent)
            .ok()
            .flatten();
        match screen.zip(size) {
            Some((screen, size)) => projection::is_visible(screen, size, viewport),
            None => false,
        }
    });
    Ok(removed)
}
