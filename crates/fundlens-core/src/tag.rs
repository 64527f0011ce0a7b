//! Tags — the taxonomy terms every donation record is classified by.
//!
//! A tag lives in exactly one taxonomy. Donor tags may carry a parent
//! pointer, forming a strict tree ("Acme" > "Acme Federal"); all other
//! taxonomies are flat.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The four classification dimensions of a donation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Taxonomy {
  /// The organisation receiving the donation (a think tank).
  Recipient,
  /// The entity giving the money; hierarchical.
  Donor,
  /// The donor-type classification of a transaction
  /// (e.g. "foreign-government", "domestic-contractor").
  Category,
  /// The calendar year a transaction is attributed to.
  Year,
}

impl Taxonomy {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Recipient => "recipient",
      Self::Donor => "donor",
      Self::Category => "category",
      Self::Year => "year",
    }
  }
}

/// A single taxonomy term. Slugs are unique within a taxonomy; display
/// names are not guaranteed unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
  pub tag_id:       Uuid,
  pub taxonomy:     Taxonomy,
  pub slug:         String,
  pub display_name: String,
  /// Parent term for hierarchical (donor) tags; `None` for roots and for
  /// every tag in a flat taxonomy.
  pub parent_id:    Option<Uuid>,
}

/// Input to [`crate::store::DonationStore::add_tag`].
/// `tag_id` is always assigned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTag {
  pub taxonomy:     Taxonomy,
  pub slug:         String,
  pub display_name: String,
  #[serde(default)]
  pub parent_id:    Option<Uuid>,
}
