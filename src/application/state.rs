// src/application/state.rs

use std::sync::Arc;

use crate::services::ResolutionService;

/// Application state shared by every command.
/// Services are initialized in main.rs and passed here.
pub struct AppState {
    pub resolution_service: Arc<ResolutionService>,
}

impl AppState {
    pub fn new(resolution_service: ResolutionService) -> Self {
        Self {
            resolution_service: Arc::new(resolution_service),
        }
    }
}
