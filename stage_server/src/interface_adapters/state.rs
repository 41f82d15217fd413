use crate::use_cases::StageRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    // Active stages and the settings new ones are created with.
    pub stage_registry: Arc<StageRegistry>,
    // Stage joined by clients that do not name one.
    pub default_stage_id: Arc<str>,
}
