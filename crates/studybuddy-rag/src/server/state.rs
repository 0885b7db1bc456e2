//! Application state for the HTTP server

use std::sync::Arc;

use crate::engine::StudyBuddyEngine;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    engine: Arc<StudyBuddyEngine>,
}

impl AppState {
    /// Wrap an initialized engine
    pub fn new(engine: Arc<StudyBuddyEngine>) -> Self {
        Self { engine }
    }

    /// The shared engine
    pub fn engine(&self) -> &StudyBuddyEngine {
        &self.engine
    }
}
