// Power-up selector and the fire-button hold trigger that arms activation mode.

use serde::{Deserialize, Serialize};

/// Power-ups in selector order. Collecting a fuel capsule outside activation
/// mode advances the selector one step, wrapping after the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PowerUp {
    #[default]
    SpeedUp,
    LaserPower,
    PlasmaBombs,
    HomingMissiles,
    SeekerMissiles,
}

impl PowerUp {
    pub const ALL: [PowerUp; 5] = [
        PowerUp::SpeedUp,
        PowerUp::LaserPower,
        PowerUp::PlasmaBombs,
        PowerUp::HomingMissiles,
        PowerUp::SeekerMissiles,
    ];

    /// Returns the power-up that follows this one in the selector.
    pub fn next(self) -> PowerUp {
        match self {
            PowerUp::SpeedUp => PowerUp::LaserPower,
            PowerUp::LaserPower => PowerUp::PlasmaBombs,
            PowerUp::PlasmaBombs => PowerUp::HomingMissiles,
            PowerUp::HomingMissiles => PowerUp::SeekerMissiles,
            PowerUp::SeekerMissiles => PowerUp::SpeedUp,
        }
    }
}

/// What releasing the fire button amounts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// Released before the hold threshold: a plain shot.
    Fire,
    /// Released after activation mode engaged: leave activation mode.
    Disarm,
    /// Release without a matching press.
    Ignored,
}

/// Debounces the fire button into taps (shots) and holds (activation mode).
///
/// Timestamps come from the stage clock so the trigger behaves the same
/// regardless of wall time or tick jitter.
#[derive(Debug, Clone)]
pub struct FireTrigger {
    hold_threshold: f32,
    pressed_at: Option<f64>,
    armed: bool,
}

impl FireTrigger {
    pub fn new(hold_threshold: f32) -> Self {
        Self {
            hold_threshold,
            pressed_at: None,
            armed: false,
        }
    }

    /// Samples the press timestamp. Repeated presses keep the first sample.
    pub fn press(&mut self, now: f64) {
        if self.pressed_at.is_none() {
            self.pressed_at = Some(now);
        }
    }

    /// Returns true once the button has been held past the threshold.
    pub fn update(&mut self, now: f64) -> bool {
        if let Some(pressed_at) = self.pressed_at {
            if !self.armed && now - pressed_at >= f64::from(self.hold_threshold) {
                self.armed = true;
            }
        }
        self.armed
    }

    pub fn release(&mut self, now: f64) -> FireOutcome {
        let Some(pressed_at) = self.pressed_at.take() else {
            return FireOutcome::Ignored;
        };

        let was_armed = self.armed || now - pressed_at >= f64::from(self.hold_threshold);
        self.armed = false;
        if was_armed {
            FireOutcome::Disarm
        } else {
            FireOutcome::Fire
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Forgets any press in progress (used when the ship is destroyed).
    pub fn reset(&mut self) {
        self.pressed_at = None;
        self.armed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_cycles_through_all_five_and_wraps() {
        let mut selected = PowerUp::SpeedUp;
        for expected in PowerUp::ALL.iter().skip(1) {
            selected = selected.next();
            assert_eq!(selected, *expected);
        }
        assert_eq!(selected.next(), PowerUp::SpeedUp);
    }

    #[test]
    fn tap_fires() {
        let mut trigger = FireTrigger::new(0.25);
        trigger.press(1.0);
        assert!(!trigger.update(1.1));
        assert_eq!(trigger.release(1.2), FireOutcome::Fire);
        assert!(!trigger.is_armed());
    }

    #[test]
    fn hold_arms_and_release_disarms_without_firing() {
        let mut trigger = FireTrigger::new(0.25);
        trigger.press(0.0);
        assert!(!trigger.update(0.2));
        assert!(trigger.update(0.25));
        assert!(trigger.is_armed());
        assert_eq!(trigger.release(0.6), FireOutcome::Disarm);
        assert!(!trigger.is_armed());
    }

    #[test]
    fn long_press_released_between_ticks_still_counts_as_hold() {
        let mut trigger = FireTrigger::new(0.25);
        trigger.press(0.0);
        assert_eq!(trigger.release(0.5), FireOutcome::Disarm);
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut trigger = FireTrigger::new(0.25);
        assert_eq!(trigger.release(3.0), FireOutcome::Ignored);
    }
}
