use crate::domain::projection::ViewportBounds;
use crate::domain::tuning::movement::MovementTuning;
use glam::Vec2;
use tracing::error;

// Direction flags raised by input during the current tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct AxisFlags {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

impl AxisFlags {
    fn vertical(&self) -> Option<f32> {
        exclusive(self.up, self.down)
    }

    fn horizontal(&self) -> Option<f32> {
        exclusive(self.right, self.left)
    }
}

// Sign of the held direction, or None when neither or both are held.
fn exclusive(positive: bool, negative: bool) -> Option<f32> {
    match (positive, negative) {
        (true, false) => Some(1.0),
        (false, true) => Some(-1.0),
        _ => None,
    }
}

/// Moves `value` toward zero by `step` without crossing it.
fn approach_zero(value: f32, step: f32) -> f32 {
    if value > 0.0 {
        (value - step).max(0.0)
    } else if value < 0.0 {
        (value + step).min(0.0)
    } else {
        0.0
    }
}

/// Acceleration-based 2D flight integrator for the pilot's ship.
///
/// Input only raises flags for the current tick; `tick` consumes them. A tick
/// without input on an axis decelerates that axis.
#[derive(Debug, Clone)]
pub struct MovementModel {
    tuning: MovementTuning,
    current_speed: Vec2,
    current_rotation: f32,
    flags: AxisFlags,
}

impl MovementModel {
    pub fn new(tuning: MovementTuning) -> Self {
        Self {
            tuning,
            current_speed: Vec2::ZERO,
            current_rotation: 0.0,
            flags: AxisFlags::default(),
        }
    }

    pub fn move_up(&mut self, intensity: f32) {
        if intensity != 0.0 {
            self.flags.up = true;
        }
    }

    pub fn move_down(&mut self, intensity: f32) {
        if intensity != 0.0 {
            self.flags.down = true;
        }
    }

    pub fn move_left(&mut self, intensity: f32) {
        if intensity != 0.0 {
            self.flags.left = true;
        }
    }

    pub fn move_right(&mut self, intensity: f32) {
        if intensity != 0.0 {
            self.flags.right = true;
        }
    }

    pub fn stop_movement(&mut self) {
        self.current_speed = Vec2::ZERO;
    }

    /// Zeroes speed, rotation and any pending input, e.g. after a respawn.
    pub fn reset(&mut self) {
        self.current_speed = Vec2::ZERO;
        self.current_rotation = 0.0;
        self.flags = AxisFlags::default();
    }

    pub fn current_speed(&self) -> Vec2 {
        self.current_speed
    }

    /// Banking angle in degrees; positive while climbing.
    pub fn current_rotation(&self) -> f32 {
        self.current_rotation
    }

    pub fn has_pending_input(&self) -> bool {
        self.flags != AxisFlags::default()
    }

    pub fn max_speed(&self, speed_up_level: u8) -> f32 {
        self.scaled(self.tuning.initial_speed, speed_up_level)
    }

    pub fn acceleration(&self, speed_up_level: u8) -> f32 {
        self.scaled(self.tuning.initial_acceleration, speed_up_level)
    }

    fn scaled(&self, base: f32, speed_up_level: u8) -> f32 {
        base * (1.0 + self.tuning.speed_up_increment * f32::from(speed_up_level))
    }

    /// Advances speed and rotation by `dt` and returns the next position,
    /// clamped to `bounds` inset by `extent` and the edge margins.
    ///
    /// Without bounds nothing changes, including the pending input.
    pub fn tick(
        &mut self,
        position: Vec2,
        dt: f32,
        speed_up_level: u8,
        extent: Vec2,
        bounds: Option<&ViewportBounds>,
    ) -> Vec2 {
        let Some(bounds) = bounds else {
            error!("failed to calculate the viewport bounds; movement skipped");
            return position;
        };

        let max_speed = self.max_speed(speed_up_level);
        let step = self.acceleration(speed_up_level) * dt;

        self.current_speed.y = match self.flags.vertical() {
            Some(sign) => (self.current_speed.y + sign * step).clamp(-max_speed, max_speed),
            None => approach_zero(self.current_speed.y, step),
        };
        self.current_speed.x = match self.flags.horizontal() {
            Some(sign) => (self.current_speed.x + sign * step).clamp(-max_speed, max_speed),
            None => approach_zero(self.current_speed.x, step),
        };
        self.apply_rotation(self.flags.vertical(), dt);

        let t = &self.tuning;
        let min_x = bounds.top_left.x + extent.x + t.margin_left;
        let max_x = bounds.bottom_right.x - extent.x - t.margin_right;
        let min_y = bounds.bottom_right.y + extent.y + t.margin_down;
        let max_y = bounds.top_left.y - extent.y - t.margin_up;

        let mut next = position + self.current_speed;
        // max/min rather than clamp: a tiny viewport can invert the range.
        next.x = next.x.max(min_x).min(max_x);
        next.y = next.y.max(min_y).min(max_y);

        if next.x <= min_x || next.x >= max_x {
            self.current_speed.x = 0.0;
        }
        if next.y <= min_y || next.y >= max_y {
            self.current_speed.y = 0.0;
        }

        self.flags = AxisFlags::default();
        next
    }

    fn apply_rotation(&mut self, vertical: Option<f32>, dt: f32) {
        let max = self.tuning.max_rotation;
        self.current_rotation = match vertical {
            Some(sign) => {
                (self.current_rotation + sign * self.tuning.rotation_speed * dt).clamp(-max, max)
            }
            None => approach_zero(
                self.current_rotation,
                self.tuning.rotation_recovery_speed * dt,
            ),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::projection::LetterboxBars;
    use approx::assert_relative_eq;
    use glam::Vec3;

    fn wide_bounds() -> ViewportBounds {
        ViewportBounds {
            top_left: Vec3::new(-10_000.0, 10_000.0, 0.0),
            bottom_right: Vec3::new(10_000.0, -10_000.0, 0.0),
            bars: LetterboxBars::default(),
        }
    }

    fn model() -> MovementModel {
        MovementModel::new(MovementTuning::default())
    }

    #[test]
    fn one_tick_of_input_accelerates_by_rate_times_dt() {
        let mut m = model();
        m.move_up(1.0);
        let next = m.tick(Vec2::ZERO, 0.1, 0, Vec2::ZERO, Some(&wide_bounds()));

        assert_relative_eq!(m.current_speed().y, 15.0);
        assert_relative_eq!(next.y, 15.0);
        assert_eq!(m.current_speed().x, 0.0);
    }

    #[test]
    fn speed_never_exceeds_the_maximum() {
        let mut m = model();
        let bounds = wide_bounds();
        for level in 0..=4 {
            m.reset();
            for _ in 0..50 {
                m.move_right(1.0);
                m.move_down(0.5);
                m.tick(Vec2::ZERO, 5.0, level, Vec2::ZERO, Some(&bounds));
                assert!(m.current_speed().x <= m.max_speed(level));
                assert!(m.current_speed().y >= -m.max_speed(level));
            }
            assert_relative_eq!(m.current_speed().x, m.max_speed(level));
        }
    }

    #[test]
    fn speed_up_level_scales_limits_linearly() {
        let m = model();
        assert_relative_eq!(m.max_speed(0), 60.0);
        assert_relative_eq!(m.max_speed(4), 120.0);
        assert_relative_eq!(m.acceleration(2), 225.0);
    }

    #[test]
    fn deceleration_snaps_to_zero_without_overshoot() {
        let mut m = model();
        let bounds = wide_bounds();
        m.move_left(1.0);
        m.tick(Vec2::ZERO, 0.1, 0, Vec2::ZERO, Some(&bounds));
        assert_relative_eq!(m.current_speed().x, -15.0);

        // 150 * 0.3 = 45 > 15: one tick lands exactly on zero.
        m.tick(Vec2::ZERO, 0.3, 0, Vec2::ZERO, Some(&bounds));
        assert_eq!(m.current_speed().x, 0.0);

        m.tick(Vec2::ZERO, 0.3, 0, Vec2::ZERO, Some(&bounds));
        assert_eq!(m.current_speed().x, 0.0);
    }

    #[test]
    fn opposite_inputs_cancel_into_deceleration() {
        let mut m = model();
        let bounds = wide_bounds();
        m.move_up(1.0);
        m.tick(Vec2::ZERO, 0.2, 0, Vec2::ZERO, Some(&bounds));

        m.move_up(1.0);
        m.move_down(1.0);
        m.tick(Vec2::ZERO, 0.1, 0, Vec2::ZERO, Some(&bounds));
        assert_relative_eq!(m.current_speed().y, 15.0);
    }

    #[test]
    fn zero_intensity_is_not_input() {
        let mut m = model();
        m.move_up(0.0);
        m.move_right(0.0);
        assert!(!m.has_pending_input());
    }

    #[test]
    fn flags_are_cleared_after_every_tick() {
        let mut m = model();
        m.move_up(1.0);
        assert!(m.has_pending_input());
        m.tick(Vec2::ZERO, 0.1, 0, Vec2::ZERO, Some(&wide_bounds()));
        assert!(!m.has_pending_input());
    }

    #[test]
    fn banking_follows_vertical_input_and_recovers() {
        let mut m = model();
        let bounds = wide_bounds();
        m.move_up(1.0);
        m.tick(Vec2::ZERO, 0.1, 0, Vec2::ZERO, Some(&bounds));
        assert_relative_eq!(m.current_rotation(), 25.0);

        m.move_up(1.0);
        m.tick(Vec2::ZERO, 0.1, 0, Vec2::ZERO, Some(&bounds));
        assert_relative_eq!(m.current_rotation(), 37.5);

        m.tick(Vec2::ZERO, 0.1, 0, Vec2::ZERO, Some(&bounds));
        assert_relative_eq!(m.current_rotation(), 17.5);
        m.tick(Vec2::ZERO, 0.1, 0, Vec2::ZERO, Some(&bounds));
        assert_eq!(m.current_rotation(), 0.0);

        m.move_down(1.0);
        m.tick(Vec2::ZERO, 1.0, 0, Vec2::ZERO, Some(&bounds));
        assert_relative_eq!(m.current_rotation(), -37.5);
    }

    #[test]
    fn hitting_an_edge_zeroes_that_axis_only() {
        let mut m = model();
        let bounds = wide_bounds();
        let extent = Vec2::new(100.0, 100.0);
        // Right edge sits at 10_000 - 100 - 50.
        let start = Vec2::new(9_840.0, 0.0);

        m.move_right(1.0);
        m.move_up(1.0);
        let next = m.tick(start, 0.2, 0, extent, Some(&bounds));

        assert_relative_eq!(next.x, 9_850.0);
        assert_eq!(m.current_speed().x, 0.0);
        assert_relative_eq!(m.current_speed().y, 30.0);
        assert_relative_eq!(next.y, 30.0);
    }

    #[test]
    fn missing_bounds_leave_everything_untouched() {
        let mut m = model();
        m.move_up(1.0);
        let position = Vec2::new(5.0, 5.0);
        let next = m.tick(position, 0.1, 0, Vec2::ZERO, None);

        assert_eq!(next, position);
        assert_eq!(m.current_speed(), Vec2::ZERO);
        assert!(m.has_pending_input());
    }

    #[test]
    fn stop_movement_zeroes_speed() {
        let mut m = model();
        m.move_up(1.0);
        m.tick(Vec2::ZERO, 0.1, 0, Vec2::ZERO, Some(&wide_bounds()));
        m.stop_movement();
        assert_eq!(m.current_speed(), Vec2::ZERO);
    }
}
