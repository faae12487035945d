//! Configuration schema, typed for serde JSON deserialization.

use std::time::Duration;

use anyhow::{bail, Result};
use imagetrace_core::ModelSelector;
use serde::{Deserialize, Serialize};

/// Default recognition service endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.animetrace.com/v1/search";

/// Default bound for both network calls, in seconds.
pub const DEFAULT_NETWORK_TIMEOUT_SECS: u64 = 15;

/// Default window for the interactive image wait, in seconds.
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 60;

/// Default bound on the longer image side, in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

/// Default JPEG re-encode quality (out of 100).
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Root configuration. Every field is defaulted so a missing or partial
/// config file still yields a runnable bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageTraceConfig {
    /// Recognition service endpoint URL.
    pub endpoint: String,

    /// Image download timeout, seconds.
    pub download_timeout_secs: u64,

    /// Recognition request timeout, seconds.
    pub recognize_timeout_secs: u64,

    /// How long an acquisition session waits for a follow-up image, seconds.
    pub wait_timeout_secs: u64,

    /// Images larger than this on their longer side are downscaled to it.
    pub max_dimension: u32,

    /// JPEG quality for the re-encoded transport image.
    pub jpeg_quality: u8,

    /// Per-profile model name overrides.
    pub models: ModelOverrides,
}

/// Optional overrides for the opaque model names sent to the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generic: Option<String>,
}

impl Default for ImageTraceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            download_timeout_secs: DEFAULT_NETWORK_TIMEOUT_SECS,
            recognize_timeout_secs: DEFAULT_NETWORK_TIMEOUT_SECS,
            wait_timeout_secs: DEFAULT_WAIT_TIMEOUT_SECS,
            max_dimension: DEFAULT_MAX_DIMENSION,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            models: ModelOverrides::default(),
        }
    }
}

impl ImageTraceConfig {
    /// Model name for a profile: the configured override, or the built-in.
    pub fn model_name(&self, selector: ModelSelector) -> String {
        let overridden = match selector {
            ModelSelector::Anime => self.models.anime.as_deref(),
            ModelSelector::Gal => self.models.gal.as_deref(),
            ModelSelector::Generic => self.models.generic.as_deref(),
        };
        overridden.unwrap_or(selector.model_name()).to_string()
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn recognize_timeout(&self) -> Duration {
        Duration::from_secs(self.recognize_timeout_secs)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    /// Reject values the pipeline cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            bail!("endpoint must not be empty");
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            bail!("jpegQuality must be in 1..=100, got {}", self.jpeg_quality);
        }
        if self.max_dimension == 0 {
            bail!("maxDimension must be at least 1");
        }
        if self.download_timeout_secs == 0
            || self.recognize_timeout_secs == 0
            || self.wait_timeout_secs == 0
        {
            bail!("timeouts must be at least 1 second");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ImageTraceConfig::default();
        config.validate().unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.max_dimension, 1024);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: ImageTraceConfig =
            serde_json::from_str(r#"{"waitTimeoutSecs": 30}"#).unwrap();
        assert_eq!(config.wait_timeout_secs, 30);
        assert_eq!(config.jpeg_quality, DEFAULT_JPEG_QUALITY);
    }

    #[test]
    fn model_override_wins() {
        let mut config = ImageTraceConfig::default();
        config.models.gal = Some("gal_model_v2".into());
        assert_eq!(config.model_name(ModelSelector::Gal), "gal_model_v2");
        assert_eq!(config.model_name(ModelSelector::Anime), "pre_stable");
    }

    #[test]
    fn out_of_range_quality_is_rejected() {
        let config = ImageTraceConfig {
            jpeg_quality: 101,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
