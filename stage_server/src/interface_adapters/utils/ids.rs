use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_STAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique id for a WebSocket connection; doubles as the player id.
pub fn next_connection_id() -> u64 {
    NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Id for a stage created without an explicit one.
pub fn next_stage_id() -> String {
    format!("stage-{}", NEXT_STAGE_ID.fetch_add(1, Ordering::Relaxed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_never_repeat() {
        let a = next_connection_id();
        let b = next_connection_id();
        assert!(b > a);
        assert_ne!(next_stage_id(), next_stage_id());
    }
}
