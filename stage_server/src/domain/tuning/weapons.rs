use serde::Deserialize;

/// Gameplay tuning for the ship's cannons and projectiles.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeaponTuning {
    /// Projectile speed in world units per second, relative to the scroll.
    pub projectile_speed: f32,

    /// Half size of a projectile's bounding box (x, y).
    pub projectile_extent: [f32; 2],

    /// Cannon muzzle offsets from the ship's center (x, y), in firing order:
    /// right, left, top.
    pub cannon_offsets: [[f32; 2]; 3],
}

impl Default for WeaponTuning {
    fn default() -> Self {
        Self {
            projectile_speed: 6000.0,
            projectile_extent: [120.0, 20.0],
            cannon_offsets: [[300.0, -60.0], [300.0, 60.0], [200.0, 150.0]],
        }
    }
}
