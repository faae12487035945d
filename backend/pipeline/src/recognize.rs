//! Recognition service client.

use std::time::Duration;

use imagetrace_config::ImageTraceConfig;
use imagetrace_core::{ModelSelector, NormalizedImage, RecognitionResult, TraceError};
use tracing::{debug, info};

/// How much of an error response body is kept in diagnostics.
const EXCERPT_CHARS: usize = 100;

/// Client for the recognition endpoint. One request per call, no retries;
/// a failed attempt surfaces as an error and ends the request.
pub struct RecognitionClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
    anime_model: String,
    gal_model: String,
    generic_model: String,
}

impl RecognitionClient {
    pub fn new(config: &ImageTraceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            timeout: config.recognize_timeout(),
            anime_model: config.model_name(ModelSelector::Anime),
            gal_model: config.model_name(ModelSelector::Gal),
            generic_model: config.model_name(ModelSelector::Generic),
        }
    }

    fn model_name(&self, model: ModelSelector) -> &str {
        match model {
            ModelSelector::Anime => &self.anime_model,
            ModelSelector::Gal => &self.gal_model,
            ModelSelector::Generic => &self.generic_model,
        }
    }

    /// Submit a normalized image for recognition.
    ///
    /// The form carries the base64 payload plus fixed flags requesting
    /// multiple detections and AI-generation detection.
    pub async fn recognize(
        &self,
        image: &NormalizedImage,
        model: ModelSelector,
    ) -> Result<RecognitionResult, TraceError> {
        let model_name = self.model_name(model);
        let form = [
            ("base64", image.as_base64()),
            ("is_multi", "1"),
            ("model", model_name),
            ("ai_detect", "1"),
        ];

        debug!("[Recognize] querying {} with model {model_name}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TraceError::Timeout("recognition request")
                } else {
                    TraceError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TraceError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            return Err(TraceError::Service {
                status: status.as_u16(),
                excerpt: excerpt(&body),
            });
        }

        // A 200 with an undecodable body is still a service-side fault.
        let result: RecognitionResult = serde_json::from_str(&body).map_err(|_| {
            TraceError::Service {
                status: status.as_u16(),
                excerpt: excerpt(&body),
            }
        })?;

        info!(
            "[Recognize] model {model_name} returned {} detection(s)",
            result.detections.len()
        );
        Ok(result)
    }
}

/// First `EXCERPT_CHARS` characters of a response body, char-boundary safe.
fn excerpt(body: &str) -> String {
    body.chars().take(EXCERPT_CHARS).collect()
}
