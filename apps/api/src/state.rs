use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::{BatchRunner, Pipeline};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Read-only after startup; shared by every document worker.
    pub pipeline: Arc<Pipeline>,
    /// Worker pool wired to the storage collaborators.
    pub batch: Arc<BatchRunner>,
    pub config: Config,
}
