//! Config file loading.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info};

use crate::env::resolve_env_vars;
use crate::schema::ImageTraceConfig;

/// Load, env-substitute, and validate the config at `path`.
///
/// A missing file is not an error; it yields the defaults (first run).
pub async fn load_config(path: &Path) -> Result<ImageTraceConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(ImageTraceConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse config JSON at: {}", path.display()))?;

    let value = resolve_env_vars(&value)?;

    let config: ImageTraceConfig = serde_json::from_value(value)
        .with_context(|| format!("Invalid config at: {}", path.display()))?;

    config.validate()?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}
