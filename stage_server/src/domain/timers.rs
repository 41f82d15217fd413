// Cooperative one-shot timers counted in stage time.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageTimer {
    /// Ends the Preparing state (stage start or respawn).
    Prepare,
    /// Leaves the game-over screen.
    GameOverExit,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    timer: StageTimer,
    remaining: f32,
}

/// At most one pending instance per timer kind; arming a pending timer does
/// nothing, so a timer never fires twice for one request.
#[derive(Debug, Clone, Default)]
pub struct StageTimers {
    pending: Vec<Pending>,
}

impl StageTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, timer: StageTimer) -> bool {
        self.pending.iter().any(|p| p.timer == timer)
    }

    /// Schedules `timer` to fire after `delay` seconds. Returns false when it
    /// is already pending.
    pub fn arm(&mut self, timer: StageTimer, delay: f32) -> bool {
        if self.is_pending(timer) {
            return false;
        }
        self.pending.push(Pending {
            timer,
            remaining: delay.max(0.0),
        });
        true
    }

    pub fn cancel(&mut self, timer: StageTimer) {
        self.pending.retain(|p| p.timer != timer);
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Advances every pending timer and returns those that expired, in the
    /// order they were armed.
    pub fn advance(&mut self, dt: f32) -> Vec<StageTimer> {
        let mut fired = Vec::new();
        self.pending.retain_mut(|p| {
            p.remaining -= dt;
            if p.remaining <= 0.0 {
                fired.push(p.timer);
                false
            } else {
                true
            }
        });
        fired
    }
}
