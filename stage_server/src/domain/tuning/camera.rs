use serde::Deserialize;

/// Gameplay tuning for the scrolling side-view camera.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    /// Distance from the camera to the play plane (z = 0).
    pub distance: f32,

    /// Horizontal field of view in degrees.
    pub fov_degrees: f32,

    /// Aspect ratio the stage is framed for; other viewports get bars.
    pub aspect_ratio: f32,

    /// Horizontal scroll speed in world units per second.
    pub scroll_speed: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            distance: 20000.0,
            fov_degrees: 90.0,
            aspect_ratio: 16.0 / 9.0,
            scroll_speed: 1000.0,
        }
    }
}
