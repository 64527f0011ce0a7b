//! Error types for `fundlens-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A stored taxonomy discriminant matching no [`crate::tag::Taxonomy`]
  /// variant.
  #[error("unknown taxonomy: {0:?}")]
  UnknownTaxonomy(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
