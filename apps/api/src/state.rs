use std::sync::Arc;

use crate::config::Config;
use crate::generation::orchestrator::CourseOrchestrator;
use crate::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub orchestrator: CourseOrchestrator,
    pub config: Arc<Config>,
}
