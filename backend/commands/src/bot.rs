//! The bot surface: the host framework feeds every inbound event here.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use imagetrace_config::ImageTraceConfig;
use imagetrace_core::{ImageRef, MessageEvent, MessageLookup, ModelSelector, TraceError};
use imagetrace_pipeline::{format_response, ImageNormalizer, RecognitionClient};
use imagetrace_session::{AcquisitionSession, RecognitionPipeline, WaiterRegistry};
use tracing::info;

use crate::detection::detect_command;
use crate::registry::CommandRegistry;

/// Live pipeline: normalize → recognize → format.
struct LivePipeline {
    normalizer: ImageNormalizer,
    client: RecognitionClient,
}

#[async_trait]
impl RecognitionPipeline for LivePipeline {
    async fn run(&self, image: &ImageRef, model: ModelSelector) -> Result<String, TraceError> {
        let normalized = self.normalizer.normalize(image).await?;
        let result = self.client.recognize(&normalized, model).await?;
        Ok(format_response(&result, model))
    }
}

/// Event entry point: routes follow-ups to waiting sessions and starts a
/// new acquisition session per detected trigger.
pub struct ImageTraceBot {
    registry: CommandRegistry,
    waiters: Arc<WaiterRegistry>,
    lookup: Arc<dyn MessageLookup>,
    pipeline: Arc<dyn RecognitionPipeline>,
    wait_timeout: Duration,
}

impl ImageTraceBot {
    pub fn new(config: &ImageTraceConfig, lookup: Arc<dyn MessageLookup>) -> Self {
        let pipeline = Arc::new(LivePipeline {
            normalizer: ImageNormalizer::new(config),
            client: RecognitionClient::new(config),
        });
        Self::with_pipeline(config.wait_timeout(), lookup, pipeline)
    }

    /// Build with a custom pipeline (embedding and tests).
    pub fn with_pipeline(
        wait_timeout: Duration,
        lookup: Arc<dyn MessageLookup>,
        pipeline: Arc<dyn RecognitionPipeline>,
    ) -> Self {
        Self {
            registry: CommandRegistry::builtin(),
            waiters: Arc::new(WaiterRegistry::new()),
            lookup,
            pipeline,
            wait_timeout,
        }
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Handle one inbound event. Returns true when the event was consumed,
    /// either by a waiting session or as a trigger; ordinary messages
    /// return false and stay with the host.
    pub async fn handle_event(&self, event: MessageEvent) -> bool {
        // Waiting sessions get first claim on their context's messages.
        if self.waiters.offer(&event).await {
            return true;
        }

        let Some(cmd) = detect_command(&event, &self.registry) else {
            return false;
        };

        info!("[Bot] /{} triggered in {}", cmd.key, event.context);
        let session = AcquisitionSession::new(
            self.waiters.clone(),
            self.lookup.clone(),
            self.pipeline.clone(),
            self.wait_timeout,
            cmd.quote_resolution,
        );
        let model = cmd.model;

        // Each trigger runs as its own task; the host's event loop moves on.
        tokio::spawn(async move {
            session.run(&event, model).await;
        });
        true
    }
}
