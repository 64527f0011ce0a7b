//! Error type for `fundlens-engine`.
//!
//! Resolver- and parameter-level problems are recovered into empty reports
//! before they ever become errors; only a missing required identifier and
//! store failures surface to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  /// A required identifying parameter is absent or does not resolve.
  #[error("missing required parameter: {0}")]
  MissingParameter(&'static str),

  /// The record store failed to fetch. Propagated untouched; no partial or
  /// cached fallback is attempted.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
