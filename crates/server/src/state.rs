use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use intent_gate::{IntentGateConfig, IntentPipeline};
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Instant;

/// Shared by every handler through `State<Arc<ServerState>>`.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Classification pipeline (shared across requests)
    pub pipeline: Arc<IntentPipeline>,
}

impl ServerState {
    /// Build the pipeline from `config.pipeline_config`, or defaults.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let pipeline_config = match &config.pipeline_config {
            Some(path) => IntentGateConfig::from_file(path)
                .map_err(|e| ServerError::Config(format!("{path}: {e}")))?,
            None => IntentGateConfig::default(),
        };
        let pipeline = IntentPipeline::from_config(&pipeline_config)?;
        Ok(Self::with_pipeline(config, pipeline))
    }

    pub fn with_pipeline(config: ServerConfig, pipeline: IntentPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }
}

static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

/// Build version and process uptime, reported by the health routes.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ServerMetadata {
    pub version: &'static str,
    pub uptime_seconds: u64,
}

impl ServerMetadata {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            uptime_seconds: STARTED_AT.elapsed().as_secs(),
        }
    }
}

/// Start the uptime clock. Called once when the router is built.
pub(crate) fn mark_started() {
    Lazy::force(&STARTED_AT);
}
