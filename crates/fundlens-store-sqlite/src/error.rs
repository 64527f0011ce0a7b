//! Error type for `fundlens-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] fundlens_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("tag not found: {0}")]
  TagNotFound(uuid::Uuid),

  /// A donor parent walk exceeded the fixed depth cap — the hierarchy data
  /// is corrupt (a cycle, or a chain deeper than any real corporate tree).
  #[error("donor hierarchy walk exceeded depth cap at tag {0}")]
  DepthCapExceeded(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
