//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. The `declines` list is
//! stored as compact JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use fundlens_core::{
  profile::RecipientProfile,
  tag::{Tag, Taxonomy},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Taxonomy ────────────────────────────────────────────────────────────────

pub fn encode_taxonomy(t: Taxonomy) -> &'static str { t.as_str() }

pub fn decode_taxonomy(s: &str) -> Result<Taxonomy> {
  match s {
    "recipient" => Ok(Taxonomy::Recipient),
    "donor" => Ok(Taxonomy::Donor),
    "category" => Ok(Taxonomy::Category),
    "year" => Ok(Taxonomy::Year),
    other => Err(Error::Core(fundlens_core::Error::UnknownTaxonomy(
      other.to_owned(),
    ))),
  }
}

// ─── Declines list ───────────────────────────────────────────────────────────

pub fn encode_declines(declines: &[String]) -> Result<String> {
  Ok(serde_json::to_string(declines)?)
}

pub fn decode_declines(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `tags` row.
pub struct RawTag {
  pub tag_id:       String,
  pub taxonomy:     String,
  pub slug:         String,
  pub display_name: String,
  pub parent_id:    Option<String>,
}

impl RawTag {
  pub fn into_tag(self) -> Result<Tag> {
    Ok(Tag {
      tag_id:       decode_uuid(&self.tag_id)?,
      taxonomy:     decode_taxonomy(&self.taxonomy)?,
      slug:         self.slug,
      display_name: self.display_name,
      parent_id:    self.parent_id.as_deref().map(decode_uuid).transpose()?,
    })
  }
}

/// Raw strings read directly from a `records` row, with the category tag
/// ids from the join table attached.
pub struct RawRecord {
  pub record_id:    String,
  pub recipient_id: String,
  pub donor_id:     String,
  pub year_id:      String,
  pub amount:       String,
  pub disclosed:    bool,
  pub source:       Option<String>,
  pub recorded_at:  String,
  pub category_ids: Vec<String>,
}

/// Raw strings read directly from a `profiles` row.
pub struct RawProfile {
  pub recipient_id:       String,
  pub transparency_score: i64,
  pub declines:           String,
}

impl RawProfile {
  pub fn into_profile(self) -> Result<RecipientProfile> {
    Ok(RecipientProfile {
      recipient_id:       decode_uuid(&self.recipient_id)?,
      transparency_score: self.transparency_score.clamp(0, 5) as u8,
      declines:           decode_declines(&self.declines)?,
    })
  }
}
