//! The `DonationStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `fundlens-store-sqlite`). Higher layers (`fundlens-engine`,
//! `fundlens-api`) depend on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  profile::RecipientProfile,
  record::{NewRecord, Record},
  tag::{NewTag, Tag, Taxonomy},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`DonationStore::fetch_records`].
///
/// Within a dimension the listed ids are OR-combined; across dimensions the
/// filters are AND-combined. An empty `Vec` / `None` means "no filter on
/// this dimension". The store gives no ordering guarantee — the engine must
/// not assume input order.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
  /// Match records whose recipient is any of these tags.
  pub recipients: Vec<Uuid>,
  /// Match records whose leaf donor is any of these tags.
  pub donors:     Vec<Uuid>,
  /// Match records carrying this category tag.
  pub category:   Option<Uuid>,
  /// Match records attributed to this year.
  pub year:       Option<Uuid>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Fundlens record store backend.
///
/// Records and tags are append-only; reports are pure reads. All methods
/// return `Send` futures so the trait can be used in multi-threaded async
/// runtimes (e.g. tokio with `axum`).
pub trait DonationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Seed writes ───────────────────────────────────────────────────────

  /// Create and persist a taxonomy term.
  fn add_tag(
    &self,
    input: NewTag,
  ) -> impl Future<Output = Result<Tag, Self::Error>> + Send + '_;

  /// Ingest a donation record. The `recorded_at` timestamp is set by the
  /// store; the amount string is parsed leniently (non-numeric → 0).
  fn add_record(
    &self,
    input: NewRecord,
  ) -> impl Future<Output = Result<Record, Self::Error>> + Send + '_;

  /// Set (or replace) the static profile for a recipient.
  fn set_profile(
    &self,
    profile: RecipientProfile,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Tag resolution ────────────────────────────────────────────────────

  /// Resolve a slug within a taxonomy. Returns `None` if unknown.
  fn resolve_slug<'a>(
    &'a self,
    taxonomy: Taxonomy,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Tag>, Self::Error>> + Send + 'a;

  /// Every term of a taxonomy, in no guaranteed order. Used as the
  /// immutable per-request universe for column completeness and
  /// zero-record rows.
  fn list_tags(
    &self,
    taxonomy: Taxonomy,
  ) -> impl Future<Output = Result<Vec<Tag>, Self::Error>> + Send + '_;

  /// Case-insensitive substring search over slug and display name.
  fn search_tags<'a>(
    &'a self,
    taxonomy: Taxonomy,
    text: &'a str,
  ) -> impl Future<Output = Result<Vec<Tag>, Self::Error>> + Send + 'a;

  /// The tag's ancestor chain, root-first and including the tag itself.
  /// A tag with no parent yields a one-element chain. Walks iteratively
  /// with a fixed depth cap to guard against data errors.
  fn ancestor_chain(
    &self,
    tag_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Tag>, Self::Error>> + Send + '_;

  /// All transitive children of a (donor) tag, excluding the tag itself.
  fn descendants(
    &self,
    tag_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Tag>, Self::Error>> + Send + '_;

  // ── Profiles ──────────────────────────────────────────────────────────

  /// Static attributes for one recipient. Independent of report filters.
  fn profile(
    &self,
    recipient_id: Uuid,
  ) -> impl Future<Output = Result<Option<RecipientProfile>, Self::Error>> + Send + '_;

  // ── Records ───────────────────────────────────────────────────────────

  /// Fetch records matching `filter`, donor chains resolved. Returns an
  /// empty list (never an error) when nothing matches.
  fn fetch_records<'a>(
    &'a self,
    filter: &'a RecordFilter,
  ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + 'a;
}
