//! Recipient profiles — static per-recipient attributes.
//!
//! A profile is independent of any report filter: changing the year or
//! donor-type filter of a report must never change a recipient's
//! transparency score.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Static attributes attached to recipient-archive rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientProfile {
  pub recipient_id:       Uuid,
  /// Editorial transparency rating, 0 (opaque) to 5 (fully transparent).
  pub transparency_score: u8,
  /// Category slugs this recipient has publicly declared it declines
  /// funding from.
  pub declines:           Vec<String>,
}

impl RecipientProfile {
  pub fn declines_category(&self, category_slug: &str) -> bool {
    self.declines.iter().any(|s| s == category_slug)
  }
}
