//! Record types — the fundamental unit of the Fundlens store.
//!
//! A record is an immutable financial transaction: one donor gave one
//! recipient some amount in some year, tagged with zero or more donor-type
//! categories. Records are never updated after ingestion; reports are
//! recomputed from scratch on every request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tag::Tag;

// ─── Record ──────────────────────────────────────────────────────────────────

/// An immutable donation record with all taxonomy references resolved.
///
/// `donor_chain` is ordered root-first: `["Acme", "Acme Federal"]` for a
/// donation attributed to the subsidiary. It is never empty for a record
/// returned by a well-behaved store; the aggregator drops (and logs) any
/// record that arrives without one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
  pub record_id:   Uuid,
  pub recipient:   Tag,
  pub donor_chain: Vec<Tag>,
  pub categories:  Vec<Tag>,
  pub year:        Tag,
  /// Minor currency units. Only meaningful when `disclosed` is true.
  pub amount:      i64,
  /// Whether the exact amount is publicly known. Undisclosed records taint
  /// every aggregate cell they contribute to.
  pub disclosed:   bool,
  /// URL of the document the record was sourced from, if any.
  pub source:      Option<String>,
  /// Server-assigned ingestion timestamp; never changes after creation.
  pub recorded_at: DateTime<Utc>,
}

impl Record {
  /// The leaf (most specific) donor tag.
  pub fn leaf_donor(&self) -> Option<&Tag> { self.donor_chain.last() }

  /// The root (outermost parent) donor tag.
  pub fn root_donor(&self) -> Option<&Tag> { self.donor_chain.first() }
}

// ─── NewRecord ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::DonationStore::add_record`].
/// `record_id` and `recorded_at` are always assigned by the store.
///
/// `amount` is accepted as text and parsed leniently — source documents
/// frequently carry thousands separators or nothing at all.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRecord {
  pub recipient_id: Uuid,
  /// The leaf donor tag; the full chain is resolved on read.
  pub donor_id:     Uuid,
  #[serde(default)]
  pub category_ids: Vec<Uuid>,
  pub year_id:      Uuid,
  pub amount:       String,
  pub disclosed:    bool,
  #[serde(default)]
  pub source:       Option<String>,
}

// ─── Amount parsing ──────────────────────────────────────────────────────────

/// Parse a raw amount field into minor units.
///
/// Empty or non-numeric input yields 0 rather than an error: a record whose
/// amount cannot be read still counts as a (zero-valued) transaction.
pub fn parse_amount(raw: &str) -> i64 {
  let cleaned: String = raw
    .chars()
    .filter(|c| c.is_ascii_digit() || *c == '-')
    .collect();
  cleaned.parse().unwrap_or(0)
}
