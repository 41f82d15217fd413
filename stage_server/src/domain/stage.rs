// Stage-level state machine driven by the pilot's deaths and the stage timers.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StageState {
    #[default]
    Preparing,
    Playing,
    GameOver,
}

impl TryFrom<u8> for StageState {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(StageState::Preparing),
            1 => Ok(StageState::Playing),
            2 => Ok(StageState::GameOver),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StageStateMachine {
    current: StageState,
}

impl StageStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_state(&self) -> StageState {
        self.current
    }

    /// Records a new state. Returns false, with no side effects, when the
    /// stage is already in `state`.
    pub fn set_state(&mut self, state: StageState) -> bool {
        if self.current == state {
            return false;
        }

        debug!(from = ?self.current, to = ?state, "stage state");
        self.current = state;
        true
    }

    /// Applies a raw state request. Unknown codes are logged and ignored.
    pub fn set_state_code(&mut self, code: u8) -> bool {
        match StageState::try_from(code) {
            Ok(state) => self.set_state(state),
            Err(code) => {
                warn!(code, "tried to set an invalid stage state; state not changed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_preparing() {
        assert_eq!(StageStateMachine::new().current_state(), StageState::Preparing);
    }

    #[test]
    fn repeated_state_reports_no_change() {
        let mut stage = StageStateMachine::new();
        assert!(stage.set_state(StageState::Playing));
        assert!(!stage.set_state(StageState::Playing));
        assert!(stage.set_state(StageState::Preparing));
        assert!(stage.set_state(StageState::GameOver));
    }

    #[test]
    fn unknown_code_leaves_state_alone() {
        let mut stage = StageStateMachine::new();
        assert!(!stage.set_state_code(3));
        assert_eq!(stage.current_state(), StageState::Preparing);
        assert!(stage.set_state_code(2));
        assert_eq!(stage.current_state(), StageState::GameOver);
    }
}
