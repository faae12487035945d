//! Runtime configuration for the imagetrace bot: typed schema with
//! defaults, JSON file loading, and `${VAR}` env substitution.

pub mod env;
pub mod io;
pub mod schema;

pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::load_config;
pub use schema::{ImageTraceConfig, ModelOverrides};
