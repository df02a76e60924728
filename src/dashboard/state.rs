//! Application state shared across handlers

use crate::prediction::Predictor;
use std::time::Instant;

/// Loaded once at startup; read-only for the life of the process
pub struct AppState {
    pub predictor: Predictor,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(predictor: Predictor) -> Self {
        Self {
            predictor,
            started_at: Instant::now(),
        }
    }
}
