//! `${VAR}` substitution in config values, resolved at load time.
//!
//! Only uppercase `[A-Z_][A-Z0-9_]*` names are matched; `$${VAR}` escapes
//! to a literal `${VAR}`. Referencing an unset or empty variable is an
//! error, reported with the config path of the offending string.

use std::collections::HashMap;

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

static ESCAPED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references across a config value tree.
/// Only string leaves are processed.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    substitute_value(value, &std::env::vars().collect(), "")
}

/// Substitute using a provided map (useful for testing).
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => {
            let items: Result<Vec<_>> = arr
                .iter()
                .enumerate()
                .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
                .collect();
            Ok(Value::Array(items?))
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                let child = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                out.insert(k.clone(), substitute_value(v, env, &child)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let whole = caps.get(0).unwrap();
        // An extra `$` immediately before the match means it's escaped;
        // leave it for the unescape pass below.
        if whole.start() > 0 && s.as_bytes()[whole.start() - 1] == b'$' {
            return caps[0].to_string();
        }
        match env.get(&caps[1]) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                if missing.is_none() {
                    missing = Some(MissingEnvVarError {
                        var_name: caps[1].to_string(),
                        config_path: path.to_string(),
                    });
                }
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }

    // Unescape: `$${VAR}` → `${VAR}`.
    Ok(ESCAPED_PATTERN
        .replace_all(&substituted, |caps: &Captures| format!("${{{}}}", &caps[1]))
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_string_leaves() {
        let value = json!({"endpoint": "${TRACE_ENDPOINT}/v1/search", "maxDimension": 512});
        let resolved =
            resolve_env_vars_with(&value, &env(&[("TRACE_ENDPOINT", "http://svc")])).unwrap();
        assert_eq!(resolved["endpoint"], "http://svc/v1/search");
        assert_eq!(resolved["maxDimension"], 512);
    }

    #[test]
    fn missing_var_reports_config_path() {
        let value = json!({"models": {"gal": "${NOPE}"}});
        let err = resolve_env_vars_with(&value, &env(&[])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("NOPE"), "{msg}");
        assert!(msg.contains("models.gal"), "{msg}");
    }

    #[test]
    fn escaped_reference_stays_literal() {
        let value = json!("$${HOME}");
        let resolved = resolve_env_vars_with(&value, &env(&[])).unwrap();
        assert_eq!(resolved, "${HOME}");
    }
}
