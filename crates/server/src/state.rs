use std::sync::Arc;

use pngflow_core::{Config, EventPipeline, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    pipeline: Arc<EventPipeline>,
}

impl AppState {
    pub fn new(config: Config, pipeline: Arc<EventPipeline>) -> Self {
        Self { config, pipeline }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn pipeline(&self) -> &EventPipeline {
        self.pipeline.as_ref()
    }
}
