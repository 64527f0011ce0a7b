//! The report request contract and its normalisation rules.
//!
//! Callers (HTTP handlers, CLI) populate a [`ReportRequest`] explicitly at
//! the boundary; the engine only ever sees the normalised form, in which
//! the sentinel value `"all"` has been folded into "no filter".

use serde::{Deserialize, Serialize};

/// The fixed set of report shapes the engine supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportShape {
  /// Every recipient, cross-tabulated by donor category.
  RecipientArchive,
  /// Every donor, grouped by root ancestor.
  DonorArchive,
  /// All donors of one named recipient, grouped by full donor chain.
  SingleRecipient,
  /// All recipients of one named donor (subsidiaries included).
  SingleDonor,
  /// Recipients ranked by total received, truncated to a limit.
  TopRecipients,
}

impl ReportShape {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::RecipientArchive => "recipient_archive",
      Self::DonorArchive => "donor_archive",
      Self::SingleRecipient => "single_recipient",
      Self::SingleDonor => "single_donor",
      Self::TopRecipients => "top_recipients",
    }
  }
}

/// Default row limit for [`ReportShape::TopRecipients`].
pub const DEFAULT_TOP_LIMIT: usize = 10;

// ─── Request ─────────────────────────────────────────────────────────────────

/// One report request. All filters are slugs; `donor_type` filters the
/// Category taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
  pub shape:      ReportShape,
  pub recipient:  Option<String>,
  pub donor:      Option<String>,
  pub year:       Option<String>,
  pub donor_type: Option<String>,
  pub search:     Option<String>,
  pub limit:      Option<usize>,
}

impl ReportRequest {
  pub fn new(shape: ReportShape) -> Self {
    Self {
      shape,
      recipient: None,
      donor: None,
      year: None,
      donor_type: None,
      search: None,
      limit: None,
    }
  }

  /// Fold `"all"` (case-insensitive) and blank strings into `None`, and an
  /// explicit limit equal to [`DEFAULT_TOP_LIMIT`] into `None`.
  ///
  /// Must run before cache-key derivation and before grouping, so that
  /// requests differing only in a redundant filter spelling produce
  /// identical results and share a cache entry.
  pub fn normalised(&self) -> Self {
    fn fold(v: &Option<String>) -> Option<String> {
      match v.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(s) if s.eq_ignore_ascii_case("all") => None,
        Some(s) => Some(s.to_owned()),
      }
    }
    Self {
      shape:      self.shape,
      recipient:  fold(&self.recipient),
      donor:      fold(&self.donor),
      year:       fold(&self.year),
      donor_type: fold(&self.donor_type),
      search:     fold(&self.search),
      limit:      self.limit.filter(|n| *n != DEFAULT_TOP_LIMIT),
    }
  }

  /// Derive the cache key for this request. Call on the normalised form
  /// only; absent filters encode as `-` so distinct filter tuples can
  /// never collide.
  pub fn cache_key(&self) -> String {
    fn part(v: &Option<String>) -> &str { v.as_deref().unwrap_or("-") }
    format!(
      "{}:{}:{}:{}:{}:{}:{}",
      self.shape.as_str(),
      part(&self.recipient),
      part(&self.donor),
      part(&self.year),
      part(&self.donor_type),
      part(&self.search),
      self.limit.map_or_else(|| "-".to_owned(), |n| n.to_string()),
    )
  }
}
