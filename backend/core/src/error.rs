use thiserror::Error;

/// Failures surfaced by the recognition pipeline.
///
/// "No image found" is not an error; locators return `Option` for that.
/// Secondary-lookup failures (`Lookup`) are absorbed at the locator boundary
/// and only ever reach the log, never the user.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("image download failed: {0}")]
    Download(String),

    #[error("image decode failed: {0}")]
    Decode(String),

    #[error("recognition service error (HTTP {status}): {excerpt}")]
    Service { status: u16, excerpt: String },

    #[error("recognition service unreachable: {0}")]
    Unreachable(String),

    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error("referenced message lookup failed: {0}")]
    Lookup(String),
}
