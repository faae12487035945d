//! The acquisition session: try the triggering event, otherwise prompt
//! and wait (bounded) for a follow-up image, then run the pipeline.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use imagetrace_core::{ImageRef, MessageEvent, MessageLookup, ModelSelector, TraceError};
use imagetrace_pipeline::locate;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::waiter::WaiterRegistry;

/// Notice sent when an image was found and recognition is starting.
pub const MSG_SEARCHING: &str = "🔍 Image detected, recognizing...";

/// Prompt sent when the trigger carried no image.
pub const MSG_PROMPT: &str = "⚠️ Send an image, or quote a message containing one";

/// Re-prompt for a follow-up that still carried no image.
pub const MSG_RETRY: &str = "⚠️ No image detected, please send one";

/// Notice sent when the wait window elapses.
pub const MSG_TIMEOUT: &str = "⏱️ Timed out waiting for an image, run the command again";

/// Notice sent when this context already has a session waiting.
pub const MSG_BUSY: &str = "⚠️ Already waiting for an image in this chat";

/// The downstream pipeline run for a resolved image: normalize, recognize,
/// format. Behind a trait so sessions can be driven against a stub.
#[async_trait]
pub trait RecognitionPipeline: Send + Sync {
    async fn run(&self, image: &ImageRef, model: ModelSelector) -> Result<String, TraceError>;
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The pipeline ran (successfully or not) on a resolved image.
    Completed,
    /// The wait window elapsed without an image; no pipeline run happened.
    TimedOut,
    /// Another session was already waiting on this context.
    Rejected,
}

/// One triggered recognition flow:
/// `Idle → AwaitingImage → Recognizing` or `AwaitingImage → TimedOut`.
///
/// A follow-up without an image re-prompts but does not reset the window;
/// the first qualifying image ends the wait for good.
pub struct AcquisitionSession {
    registry: Arc<WaiterRegistry>,
    lookup: Arc<dyn MessageLookup>,
    pipeline: Arc<dyn RecognitionPipeline>,
    wait_timeout: Duration,
    resolve_quotes: bool,
}

impl AcquisitionSession {
    pub fn new(
        registry: Arc<WaiterRegistry>,
        lookup: Arc<dyn MessageLookup>,
        pipeline: Arc<dyn RecognitionPipeline>,
        wait_timeout: Duration,
        resolve_quotes: bool,
    ) -> Self {
        Self {
            registry,
            lookup,
            pipeline,
            wait_timeout,
            resolve_quotes,
        }
    }

    /// Drive the session for one triggering event.
    pub async fn run(&self, trigger: &MessageEvent, model: ModelSelector) -> SessionOutcome {
        if let Some(image) = locate(trigger, self.lookup.as_ref(), self.resolve_quotes).await {
            self.reply(trigger, MSG_SEARCHING).await;
            self.recognize_and_reply(trigger, &image, model).await;
            return SessionOutcome::Completed;
        }

        let Some(mut follow_ups) = self.registry.register(&trigger.context).await else {
            self.reply(trigger, MSG_BUSY).await;
            return SessionOutcome::Rejected;
        };

        self.reply(trigger, MSG_PROMPT).await;
        info!("[Session] awaiting image in {}", trigger.context);

        // One fixed deadline for the whole wait; re-prompts do not extend it.
        let deadline = Instant::now() + self.wait_timeout;
        loop {
            match tokio::time::timeout_at(deadline, follow_ups.recv()).await {
                Err(_) | Ok(None) => {
                    self.registry.unregister(&trigger.context).await;
                    info!("[Session] wait in {} timed out", trigger.context);
                    self.reply(trigger, MSG_TIMEOUT).await;
                    return SessionOutcome::TimedOut;
                }
                Ok(Some(follow_up)) => {
                    let Some(image) =
                        locate(&follow_up, self.lookup.as_ref(), self.resolve_quotes).await
                    else {
                        self.reply(&follow_up, MSG_RETRY).await;
                        continue;
                    };
                    // Resolved: release the slot before the (slow) pipeline
                    // so later events fall through to normal handling.
                    self.registry.unregister(&trigger.context).await;
                    self.reply(&follow_up, MSG_SEARCHING).await;
                    self.recognize_and_reply(&follow_up, &image, model).await;
                    return SessionOutcome::Completed;
                }
            }
        }
    }

    async fn recognize_and_reply(&self, event: &MessageEvent, image: &ImageRef, model: ModelSelector) {
        match self.pipeline.run(image, model).await {
            Ok(text) => self.reply(event, &text).await,
            Err(e) => {
                error!("[Session] recognition failed in {}: {e}", event.context);
                self.reply(event, &format!("❌ Recognition failed: {e}")).await;
            }
        }
    }

    async fn reply(&self, event: &MessageEvent, text: &str) {
        if let Err(e) = event.reply(text).await {
            warn!("[Session] reply to {} failed: {e:#}", event.context);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use imagetrace_core::{ContextKey, MessageSegment, Platform, ReplySink};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Sink collecting every reply text.
    #[derive(Default)]
    struct RecordingSink {
        texts: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn texts(&self) -> Vec<String> {
            self.texts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReplySink for RecordingSink {
        async fn send(&self, text: &str) -> Result<()> {
            self.texts.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    /// Lookup for platforms without a message store.
    struct NoLookup;

    #[async_trait]
    impl MessageLookup for NoLookup {
        async fn get_message(&self, _message_id: &str) -> Result<serde_json::Value> {
            bail!("no message store")
        }
    }

    /// Pipeline stub counting runs.
    #[derive(Default)]
    struct CountingPipeline {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl RecognitionPipeline for CountingPipeline {
        async fn run(&self, image: &ImageRef, _model: ModelSelector) -> Result<String, TraceError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(format!("recognized {image}"))
        }
    }

    struct Fixture {
        registry: Arc<WaiterRegistry>,
        pipeline: Arc<CountingPipeline>,
        sink: Arc<RecordingSink>,
        context: ContextKey,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: Arc::new(WaiterRegistry::new()),
                pipeline: Arc::new(CountingPipeline::default()),
                sink: Arc::new(RecordingSink::default()),
                context: ContextKey::new("chan", "alice"),
            }
        }

        fn session(&self, wait: Duration) -> AcquisitionSession {
            AcquisitionSession::new(
                self.registry.clone(),
                Arc::new(NoLookup),
                self.pipeline.clone(),
                wait,
                true,
            )
        }

        fn event(&self, segments: Vec<MessageSegment>) -> MessageEvent {
            MessageEvent::new(
                Platform::OneBot,
                self.context.clone(),
                segments,
                self.sink.clone(),
            )
        }
    }

    #[tokio::test]
    async fn direct_image_skips_the_wait() {
        let fx = Fixture::new();
        let session = fx.session(Duration::from_secs(5));
        let trigger = fx.event(vec![MessageSegment::image("http://x/y.png")]);

        let outcome = session.run(&trigger, ModelSelector::Generic).await;

        assert_eq!(outcome, SessionOutcome::Completed);
        assert_eq!(fx.pipeline.runs.load(Ordering::SeqCst), 1);
        assert_eq!(
            fx.sink.texts(),
            vec![MSG_SEARCHING.to_string(), "recognized http://x/y.png".to_string()]
        );
        assert!(!fx.registry.is_waiting(&fx.context).await);
    }

    #[tokio::test]
    async fn no_follow_up_times_out_with_one_message_and_zero_runs() {
        let fx = Fixture::new();
        let session = fx.session(Duration::from_millis(50));
        let trigger = fx.event(vec![MessageSegment::text("/detect")]);

        let outcome = session.run(&trigger, ModelSelector::Generic).await;

        assert_eq!(outcome, SessionOutcome::TimedOut);
        assert_eq!(fx.pipeline.runs.load(Ordering::SeqCst), 0);
        assert_eq!(
            fx.sink.texts(),
            vec![MSG_PROMPT.to_string(), MSG_TIMEOUT.to_string()]
        );
        assert!(!fx.registry.is_waiting(&fx.context).await);
    }

    #[tokio::test]
    async fn follow_up_image_runs_the_pipeline_once_and_ends_the_wait() {
        let fx = Fixture::new();
        let session = fx.session(Duration::from_secs(5));
        let trigger = fx.event(vec![MessageSegment::text("/detect")]);
        let follow_up = fx.event(vec![MessageSegment::image("http://z")]);

        let registry = fx.registry.clone();
        let handle = tokio::spawn(async move {
            // Wait until the session is actually registered, then offer.
            for _ in 0..100 {
                if registry.offer(&follow_up).await {
                    return true;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            false
        });

        let outcome = session.run(&trigger, ModelSelector::Anime).await;
        assert!(handle.await.unwrap(), "follow-up was never consumed");

        assert_eq!(outcome, SessionOutcome::Completed);
        assert_eq!(fx.pipeline.runs.load(Ordering::SeqCst), 1);
        assert!(!fx.registry.is_waiting(&fx.context).await);
        let texts = fx.sink.texts();
        assert_eq!(texts[0], MSG_PROMPT);
        assert_eq!(texts[1], MSG_SEARCHING);
        assert_eq!(texts[2], "recognized http://z");
    }

    #[tokio::test]
    async fn imageless_follow_up_reprompts_without_resetting_the_window() {
        let fx = Fixture::new();
        let session = fx.session(Duration::from_millis(120));
        let trigger = fx.event(vec![MessageSegment::text("/detect")]);
        let follow_up = fx.event(vec![MessageSegment::text("hold on")]);

        let registry = fx.registry.clone();
        tokio::spawn(async move {
            for _ in 0..100 {
                if registry.offer(&follow_up).await {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        });

        let started = Instant::now();
        let outcome = session.run(&trigger, ModelSelector::Generic).await;
        let elapsed = started.elapsed();

        assert_eq!(outcome, SessionOutcome::TimedOut);
        assert_eq!(fx.pipeline.runs.load(Ordering::SeqCst), 0);
        // The retry consumed an event but kept the original deadline.
        assert!(elapsed < Duration::from_millis(400), "window was reset: {elapsed:?}");
        assert_eq!(
            fx.sink.texts(),
            vec![
                MSG_PROMPT.to_string(),
                MSG_RETRY.to_string(),
                MSG_TIMEOUT.to_string()
            ]
        );
    }

    #[tokio::test]
    async fn second_trigger_while_waiting_is_rejected() {
        let fx = Fixture::new();
        let session = fx.session(Duration::from_secs(5));
        let trigger = fx.event(vec![MessageSegment::text("/detect")]);

        let _rx = fx.registry.register(&fx.context).await.unwrap();
        let outcome = session.run(&trigger, ModelSelector::Generic).await;

        assert_eq!(outcome, SessionOutcome::Rejected);
        assert_eq!(fx.sink.texts(), vec![MSG_BUSY.to_string()]);
        // The original waiter still holds the slot.
        assert!(fx.registry.is_waiting(&fx.context).await);
    }

    #[tokio::test]
    async fn pipeline_errors_surface_as_a_failure_reply() {
        struct FailingPipeline;

        #[async_trait]
        impl RecognitionPipeline for FailingPipeline {
            async fn run(
                &self,
                _image: &ImageRef,
                _model: ModelSelector,
            ) -> Result<String, TraceError> {
                Err(TraceError::Service {
                    status: 500,
                    excerpt: "boom".into(),
                })
            }
        }

        let fx = Fixture::new();
        let session = AcquisitionSession::new(
            fx.registry.clone(),
            Arc::new(NoLookup),
            Arc::new(FailingPipeline),
            Duration::from_secs(5),
            true,
        );
        let trigger = fx.event(vec![MessageSegment::image("http://x")]);

        let outcome = session.run(&trigger, ModelSelector::Generic).await;

        assert_eq!(outcome, SessionOutcome::Completed);
        let texts = fx.sink.texts();
        assert_eq!(texts[0], MSG_SEARCHING);
        assert!(texts[1].starts_with("❌ Recognition failed:"), "{}", texts[1]);
        assert!(texts[1].contains("HTTP 500"));
    }
}
