//! Conversions between world space and screen space.
//!
//! The play area is the `z = 0` plane seen from a perspective camera. Screen
//! coordinates are pixels with the origin at the top-left corner of the
//! viewport and `y` growing downwards. When the viewport's aspect ratio differs
//! from the camera's, the camera image is centered and the remaining space is
//! filled by black bars; every conversion accounts for them.

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

const NEAR_PLANE: f32 = 10.0;
const FAR_PLANE: f32 = 1_000_000.0;
const ASPECT_EPSILON: f32 = 1e-4;

/// Failures that leave a conversion without a meaningful result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionError {
    /// The viewport has no area yet (no client has reported its size).
    EmptyViewport,
    /// The camera has no usable direction, field of view or aspect ratio.
    DegenerateCamera,
}

/// Viewport size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Snapshot of the active camera used for a conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    /// Horizontal field of view in degrees.
    pub fov_degrees: f32,
    /// Aspect ratio (width / height) the camera image is framed for.
    pub aspect_ratio: f32,
}

impl CameraView {
    /// Distance from the camera to the play plane.
    pub fn plane_distance(&self) -> f32 {
        self.position.z.abs()
    }

    fn validate(&self) -> Result<(), ProjectionError> {
        let usable = self.forward.length_squared() > 0.0
            && self.up.length_squared() > 0.0
            && self.forward.cross(self.up).length_squared() > 0.0
            && self.fov_degrees > 0.0
            && self.fov_degrees < 180.0
            && self.aspect_ratio > 0.0
            && self.aspect_ratio.is_finite();
        if usable {
            Ok(())
        } else {
            Err(ProjectionError::DegenerateCamera)
        }
    }

    fn vertical_fov(&self) -> f32 {
        let half_h = (self.fov_degrees.to_radians() * 0.5).tan();
        2.0 * (half_h / self.aspect_ratio).atan()
    }

    fn view_projection(&self) -> Mat4 {
        let view = Mat4::look_to_rh(self.position, self.forward.normalize(), self.up.normalize());
        let projection =
            Mat4::perspective_rh(self.vertical_fov(), self.aspect_ratio, NEAR_PLANE, FAR_PLANE);
        projection * view
    }
}

/// Sizes of the black bars around the camera image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LetterboxBars {
    /// Height of each of the top and bottom bars.
    pub horizontal: f32,
    /// Width of each of the left and right bars.
    pub vertical: f32,
}

/// World-space corners of the visible slice of the play plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportBounds {
    pub top_left: Vec3,
    pub bottom_right: Vec3,
    pub bars: LetterboxBars,
}

pub fn letterbox_bars(viewport: Viewport, camera_aspect_ratio: f32) -> LetterboxBars {
    let viewport_aspect = viewport.width / viewport.height;
    let mut bars = LetterboxBars::default();

    if (viewport_aspect - camera_aspect_ratio).abs() <= ASPECT_EPSILON {
        return bars;
    }
    if viewport_aspect < camera_aspect_ratio {
        bars.horizontal = (viewport.height - viewport.width / camera_aspect_ratio) / 2.0;
    } else {
        bars.vertical = (viewport.width - viewport.height * camera_aspect_ratio) / 2.0;
    }
    bars
}

/// Pixel rectangle (min, max) covered by the camera image.
fn image_rect(viewport: Viewport, camera_aspect_ratio: f32) -> (Vec2, Vec2) {
    let bars = letterbox_bars(viewport, camera_aspect_ratio);
    let min = Vec2::new(bars.vertical, bars.horizontal);
    let max = viewport.size() - min;
    (min, max)
}

/// Projects a world point to screen coordinates. Returns `None` for points
/// behind the camera.
pub fn world_to_screen(
    camera: &CameraView,
    viewport: Viewport,
    point: Vec3,
) -> Result<Option<Vec2>, ProjectionError> {
    check(camera, viewport)?;

    let clip = camera.view_projection() * point.extend(1.0);
    if clip.w <= 0.0 {
        return Ok(None);
    }
    let ndc = Vec2::new(clip.x / clip.w, clip.y / clip.w);

    let (min, max) = image_rect(viewport, camera.aspect_ratio);
    let size = max - min;
    Ok(Some(Vec2::new(
        min.x + (ndc.x + 1.0) * 0.5 * size.x,
        min.y + (1.0 - ndc.y) * 0.5 * size.y,
    )))
}

/// Returns the world point `viewing_distance` units from the camera along the
/// ray through `screen`.
pub fn screen_to_world(
    camera: &CameraView,
    viewport: Viewport,
    screen: Vec2,
    viewing_distance: f32,
) -> Result<Vec3, ProjectionError> {
    check(camera, viewport)?;

    let (min, max) = image_rect(viewport, camera.aspect_ratio);
    let size = max - min;
    let ndc_x = (screen.x - min.x) / size.x * 2.0 - 1.0;
    let ndc_y = 1.0 - (screen.y - min.y) / size.y * 2.0;

    let inverse = camera.view_projection().inverse();
    let near = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
    let far = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
    let direction = (far - near).normalize_or_zero();
    if direction == Vec3::ZERO {
        return Err(ProjectionError::DegenerateCamera);
    }

    Ok(camera.position + direction * viewing_distance)
}

/// World-space corners of the visible play area at the camera's distance,
/// excluding any letterbox or pillarbox bars.
pub fn viewport_bounds(
    camera: &CameraView,
    viewport: Viewport,
) -> Result<ViewportBounds, ProjectionError> {
    check(camera, viewport)?;

    let bars = letterbox_bars(viewport, camera.aspect_ratio);
    let distance = camera.plane_distance();
    let top_left = screen_to_world(
        camera,
        viewport,
        Vec2::new(bars.vertical, bars.horizontal),
        distance,
    )?;
    let bottom_right = screen_to_world(
        camera,
        viewport,
        Vec2::new(viewport.width - bars.vertical, viewport.height - bars.horizontal),
        distance,
    )?;

    Ok(ViewportBounds {
        top_left,
        bottom_right,
        bars,
    })
}

/// On-screen size of an axis-aligned box given by its center and half extent.
pub fn size_in_screen(
    camera: &CameraView,
    viewport: Viewport,
    origin: Vec3,
    extent: Vec3,
) -> Result<Option<Vec2>, ProjectionError> {
    let a = world_to_screen(camera, viewport, origin - extent)?;
    let b = world_to_screen(camera, viewport, origin + extent)?;
    Ok(a.zip(b).map(|(a, b)| (b - a).abs()))
}

/// True unless the box centered at `position` lies entirely outside the
/// viewport on either axis.
pub fn is_visible(position: Vec2, size: Vec2, viewport: Viewport) -> bool {
    let half = size * 0.5;
    !(position.x + half.x < 0.0
        || position.x - half.x > viewport.width
        || position.y + half.y < 0.0
        || position.y - half.y > viewport.height)
}

fn check(camera: &CameraView, viewport: Viewport) -> Result<(), ProjectionError> {
    if viewport.is_empty() {
        return Err(ProjectionError::EmptyViewport);
    }
    camera.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn side_camera(x: f32) -> CameraView {
        CameraView {
            position: Vec3::new(x, 0.0, 20000.0),
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
            fov_degrees: 90.0,
            aspect_ratio: 16.0 / 9.0,
        }
    }

    #[test]
    fn matching_aspect_ratio_has_no_bars() {
        let bars = letterbox_bars(Viewport::new(1920.0, 1080.0), 16.0 / 9.0);
        assert_eq!(bars, LetterboxBars::default());
    }

    #[test]
    fn taller_viewport_gets_top_and_bottom_bars() {
        let bars = letterbox_bars(Viewport::new(1920.0, 1200.0), 16.0 / 9.0);
        assert_relative_eq!(bars.horizontal, 60.0, epsilon = 1e-3);
        assert_eq!(bars.vertical, 0.0);
    }

    #[test]
    fn wider_viewport_gets_side_bars() {
        let bars = letterbox_bars(Viewport::new(2560.0, 1080.0), 16.0 / 9.0);
        assert_relative_eq!(bars.vertical, (2560.0 - 1080.0 * 16.0 / 9.0) / 2.0, epsilon = 1e-3);
        assert_eq!(bars.horizontal, 0.0);
    }

    #[test]
    fn camera_target_projects_to_the_center() {
        let camera = side_camera(500.0);
        let viewport = Viewport::new(1920.0, 1080.0);
        let screen = world_to_screen(&camera, viewport, Vec3::new(500.0, 0.0, 0.0))
            .unwrap()
            .unwrap();
        assert_relative_eq!(screen.x, 960.0, epsilon = 1e-2);
        assert_relative_eq!(screen.y, 540.0, epsilon = 1e-2);
    }

    #[test]
    fn screen_axes_follow_world_axes() {
        let camera = side_camera(0.0);
        let viewport = Viewport::new(1920.0, 1080.0);
        let up_right = world_to_screen(&camera, viewport, Vec3::new(1000.0, 1000.0, 0.0))
            .unwrap()
            .unwrap();
        assert!(up_right.x > 960.0);
        assert!(up_right.y < 540.0);
    }

    #[test]
    fn points_behind_the_camera_do_not_project() {
        let camera = side_camera(0.0);
        let behind = world_to_screen(&camera, Viewport::new(800.0, 600.0), Vec3::new(0.0, 0.0, 30000.0));
        assert_eq!(behind, Ok(None));
    }

    #[test]
    fn center_ray_reaches_the_play_plane() {
        let camera = side_camera(250.0);
        let viewport = Viewport::new(1920.0, 1080.0);
        let world =
            screen_to_world(&camera, viewport, Vec2::new(960.0, 540.0), camera.plane_distance())
                .unwrap();
        assert_relative_eq!(world.x, 250.0, epsilon = 0.5);
        assert_relative_eq!(world.y, 0.0, epsilon = 0.5);
        assert_relative_eq!(world.z, 0.0, epsilon = 0.5);
    }

    #[test]
    fn screen_round_trip_lands_on_the_same_pixel() {
        let camera = side_camera(0.0);
        let viewport = Viewport::new(1920.0, 1200.0);
        let pixel = Vec2::new(300.0, 900.0);
        let world = screen_to_world(&camera, viewport, pixel, 15000.0).unwrap();
        let back = world_to_screen(&camera, viewport, world).unwrap().unwrap();
        assert_relative_eq!(back.x, pixel.x, epsilon = 0.1);
        assert_relative_eq!(back.y, pixel.y, epsilon = 0.1);
    }

    #[test]
    fn bounds_are_symmetric_around_the_camera() {
        let camera = side_camera(1000.0);
        let bounds = viewport_bounds(&camera, Viewport::new(1920.0, 1080.0)).unwrap();

        assert!(bounds.top_left.x < 1000.0 && bounds.bottom_right.x > 1000.0);
        assert!(bounds.top_left.y > 0.0 && bounds.bottom_right.y < 0.0);
        assert_relative_eq!(1000.0 - bounds.top_left.x, bounds.bottom_right.x - 1000.0, epsilon = 1.0);
        assert_relative_eq!(bounds.top_left.y, -bounds.bottom_right.y, epsilon = 1.0);
        assert_eq!(bounds.bars, LetterboxBars::default());
    }

    #[test]
    fn letterboxing_keeps_the_same_world_slice() {
        let camera = side_camera(0.0);
        let full = viewport_bounds(&camera, Viewport::new(1920.0, 1080.0)).unwrap();
        let boxed = viewport_bounds(&camera, Viewport::new(1920.0, 1200.0)).unwrap();

        assert!(boxed.bars.horizontal > 0.0);
        assert_relative_eq!(full.top_left.x, boxed.top_left.x, epsilon = 1.0);
        assert_relative_eq!(full.top_left.y, boxed.top_left.y, epsilon = 1.0);
        assert_relative_eq!(full.bottom_right.y, boxed.bottom_right.y, epsilon = 1.0);
    }

    #[test]
    fn missing_collaborators_are_reported() {
        let camera = side_camera(0.0);
        assert_eq!(
            viewport_bounds(&camera, Viewport::new(0.0, 1080.0)),
            Err(ProjectionError::EmptyViewport)
        );

        let mut broken = camera;
        broken.aspect_ratio = 0.0;
        assert_eq!(
            viewport_bounds(&broken, Viewport::new(1920.0, 1080.0)),
            Err(ProjectionError::DegenerateCamera)
        );
    }

    #[test]
    fn visibility_only_fails_when_fully_outside() {
        let viewport = Viewport::new(800.0, 600.0);
        let size = Vec2::new(40.0, 40.0);

        assert!(is_visible(Vec2::new(400.0, 300.0), size, viewport));
        assert!(is_visible(Vec2::new(-10.0, 300.0), size, viewport));
        assert!(is_visible(Vec2::new(400.0, 615.0), size, viewport));
        assert!(!is_visible(Vec2::new(-30.0, 300.0), size, viewport));
        assert!(!is_visible(Vec2::new(830.0, 300.0), size, viewport));
        assert!(!is_visible(Vec2::new(400.0, -25.0), size, viewport));
        assert!(!is_visible(Vec2::new(400.0, 621.0), size, viewport));
    }

    #[test]
    fn box_size_shrinks_with_distance() {
        let camera = side_camera(0.0);
        let viewport = Viewport::new(1920.0, 1080.0);
        let extent = Vec3::new(100.0, 100.0, 0.0);

        let near = size_in_screen(&camera, viewport, Vec3::new(0.0, 0.0, 10000.0), extent)
            .unwrap()
            .unwrap();
        let far = size_in_screen(&camera, viewport, Vec3::ZERO, extent).unwrap().unwrap();
        assert!(near.x > far.x);
        assert_relative_eq!(far.x, 1920.0 * 200.0 / 40000.0, epsilon = 0.5);
    }
}
