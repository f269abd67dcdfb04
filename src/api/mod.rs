//! HTTP API for the sports highlighter.
//!
//! One inbound operation: upload a video with a sport category (and an
//! optional single moment) and get back the assembled highlight clip.

pub mod models;
pub mod server;

use anyhow::Result;
use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::HighlightPipeline;

/// API server wrapping the highlight pipeline
pub struct ApiServer {
    pipeline: Arc<HighlightPipeline>,
    config: Arc<Config>,
}

impl ApiServer {
    pub fn new(pipeline: Arc<HighlightPipeline>, config: Arc<Config>) -> Self {
        Self { pipeline, config }
    }

    /// Start the API server and serve until shutdown
    pub async fn start(self) -> Result<()> {
        server::start_http_server(self.pipeline, self.config).await
    }
}
