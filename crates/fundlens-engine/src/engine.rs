//! [`ReportEngine`] — request orchestration over any [`DonationStore`].
//!
//! One request fully computes (or retrieves from cache) one table before
//! returning. The taxonomy universes needed for column completeness are
//! loaded once per request as immutable snapshots and passed explicitly
//! into the assembler.

use std::{collections::HashMap, sync::Arc, time::Duration};

use fundlens_core::{
  profile::RecipientProfile,
  report::ReportTable,
  request::{DEFAULT_TOP_LIMIT, ReportRequest, ReportShape},
  store::{DonationStore, RecordFilter},
  tag::{Tag, Taxonomy},
};
use uuid::Uuid;

use crate::{
  EngineError, Result, aggregate, assemble,
  cache::{DEFAULT_TTL, MemoryCache, ReportCache},
};

// ─── Filter resolution ───────────────────────────────────────────────────────

/// Outcome of resolving an optional filter slug.
enum Filter {
  /// No filter supplied.
  Absent,
  Resolved(Tag),
  /// A slug was supplied but matches no tag: the report is empty, not an
  /// error.
  Unmatched,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The aggregation engine. Generic over the storage backend; holds an
/// injected [`ReportCache`] as its only shared state.
pub struct ReportEngine<S> {
  store: Arc<S>,
  cache: Arc<dyn ReportCache>,
  ttl:   Duration,
}

impl<S: DonationStore> ReportEngine<S> {
  /// Engine with the default in-memory cache and a 12-hour TTL.
  pub fn new(store: Arc<S>) -> Self {
    Self::with_cache(store, Arc::new(MemoryCache::new()), DEFAULT_TTL)
  }

  pub fn with_cache(
    store: Arc<S>,
    cache: Arc<dyn ReportCache>,
    ttl: Duration,
  ) -> Self {
    Self { store, cache, ttl }
  }

  /// Generate the report for `request`, consulting the cache first.
  ///
  /// The request is normalised before anything else, so `year="all"` and an
  /// absent year share a cache entry and produce identical tables.
  pub async fn generate(
    &self,
    request: &ReportRequest,
  ) -> Result<Arc<ReportTable>> {
    let request = request.normalised();
    let key = request.cache_key();

    if let Some(hit) = self.cache.get(&key) {
      return Ok(hit);
    }

    let table = match request.shape {
      ReportShape::RecipientArchive => self.recipient_archive(&request).await?,
      ReportShape::DonorArchive => self.donor_archive(&request).await?,
      ReportShape::SingleRecipient => self.single_recipient(&request).await?,
      ReportShape::SingleDonor => self.single_donor(&request).await?,
      ReportShape::TopRecipients => self.top_recipients(&request).await?,
    };

    let table = Arc::new(table);
    self.cache.put(&key, table.clone(), self.ttl);
    Ok(table)
  }

  // ── Report shapes ─────────────────────────────────────────────────────────

  /// Every recipient (or every recipient matching the search text), one row
  /// each, cross-tabulated against the entire category taxonomy.
  async fn recipient_archive(&self, req: &ReportRequest) -> Result<ReportTable> {
    let categories = self.list(Taxonomy::Category).await?;
    let columns = || assemble::recipient_archive_columns(&categories);

    let year = match self.filter(Taxonomy::Year, &req.year).await? {
      Filter::Unmatched => return Ok(ReportTable::empty(columns())),
      other => other,
    };

    let recipients = match &req.search {
      Some(text) => self.search(Taxonomy::Recipient, text).await?,
      None => self.list(Taxonomy::Recipient).await?,
    };
    if req.search.is_some() && recipients.is_empty() {
      return Ok(ReportTable::empty(columns()));
    }

    let mut filter = RecordFilter::default();
    if req.search.is_some() {
      filter.recipients = recipients.iter().map(|t| t.tag_id).collect();
    }
    filter.year = tag_id(&year);

    let records = self.fetch(&filter).await?;
    let matrix = aggregate::group_recipient_matrix(&recipients, &records);
    let profiles = self.profiles_for(&recipients).await?;

    Ok(assemble::recipient_archive_table(&matrix, &categories, &profiles))
  }

  /// Every donor with matching records, grouped by root ancestor.
  async fn donor_archive(&self, req: &ReportRequest) -> Result<ReportTable> {
    let empty = || ReportTable::empty(assemble::donor_archive_columns());

    let year = match self.filter(Taxonomy::Year, &req.year).await? {
      Filter::Unmatched => return Ok(empty()),
      other => other,
    };
    let category =
      match self.filter(Taxonomy::Category, &req.donor_type).await? {
        Filter::Unmatched => return Ok(empty()),
        other => other,
      };

    let mut filter = RecordFilter {
      year: tag_id(&year),
      category: tag_id(&category),
      ..Default::default()
    };

    if let Some(text) = &req.search {
      let donors = self.search(Taxonomy::Donor, text).await?;
      if donors.is_empty() {
        return Ok(empty());
      }
      // A search hit on a parent donor also covers records attributed to
      // its subsidiaries.
      filter.donors = self.with_descendants(&donors).await?;
    }

    let records = self.fetch(&filter).await?;
    let groups = aggregate::group_by_root_donor(&records);
    Ok(assemble::donor_archive_table(&groups))
  }

  /// All donors of one named recipient, grouped by full donor chain.
  async fn single_recipient(&self, req: &ReportRequest) -> Result<ReportTable> {
    let Some(slug) = &req.recipient else {
      return Err(EngineError::MissingParameter("recipient"));
    };
    // An unresolvable required identifier is equivalent to a missing one.
    let Some(recipient) = self.resolve(Taxonomy::Recipient, slug).await? else {
      return Err(EngineError::MissingParameter("recipient"));
    };

    let empty = || ReportTable::empty(assemble::single_recipient_columns());

    let year = match self.filter(Taxonomy::Year, &req.year).await? {
      Filter::Unmatched => return Ok(empty()),
      other => other,
    };
    let category =
      match self.filter(Taxonomy::Category, &req.donor_type).await? {
        Filter::Unmatched => return Ok(empty()),
        other => other,
      };

    let filter = RecordFilter {
      recipients: vec![recipient.tag_id],
      year: tag_id(&year),
      category: tag_id(&category),
      ..Default::default()
    };

    let records = self.fetch(&filter).await?;
    let groups = aggregate::group_by_donor_chain(&records);
    Ok(assemble::single_recipient_table(&groups))
  }

  /// All recipients of one named donor, subsidiaries included.
  async fn single_donor(&self, req: &ReportRequest) -> Result<ReportTable> {
    let Some(slug) = &req.donor else {
      return Err(EngineError::MissingParameter("donor"));
    };
    let Some(donor) = self.resolve(Taxonomy::Donor, slug).await? else {
      return Err(EngineError::MissingParameter("donor"));
    };

    let empty = || ReportTable::empty(assemble::single_donor_columns());

    let year = match self.filter(Taxonomy::Year, &req.year).await? {
      Filter::Unmatched => return Ok(empty()),
      other => other,
    };
    let category =
      match self.filter(Taxonomy::Category, &req.donor_type).await? {
        Filter::Unmatched => return Ok(empty()),
        other => other,
      };

    let filter = RecordFilter {
      donors: self.with_descendants(std::slice::from_ref(&donor)).await?,
      year: tag_id(&year),
      category: tag_id(&category),
      ..Default::default()
    };

    let records = self.fetch(&filter).await?;
    let groups = aggregate::group_by_recipient(&records);
    Ok(assemble::single_donor_table(&groups))
  }

  /// Recipients ranked by total received across all matching records.
  async fn top_recipients(&self, req: &ReportRequest) -> Result<ReportTable> {
    let empty = || ReportTable::empty(assemble::top_recipients_columns());

    let year = match self.filter(Taxonomy::Year, &req.year).await? {
      Filter::Unmatched => return Ok(empty()),
      other => other,
    };
    let category =
      match self.filter(Taxonomy::Category, &req.donor_type).await? {
        Filter::Unmatched => return Ok(empty()),
        other => other,
      };

    let filter = RecordFilter {
      year: tag_id(&year),
      category: tag_id(&category),
      ..Default::default()
    };

    let records = self.fetch(&filter).await?;
    let limit = req.limit.unwrap_or(DEFAULT_TOP_LIMIT);
    let groups = aggregate::rank_recipients(&records, limit);
    Ok(assemble::top_recipients_table(&groups))
  }

  // ── Store access ──────────────────────────────────────────────────────────

  async fn filter(
    &self,
    taxonomy: Taxonomy,
    slug: &Option<String>,
  ) -> Result<Filter> {
    let Some(slug) = slug else {
      return Ok(Filter::Absent);
    };
    match self.resolve(taxonomy, slug).await? {
      Some(tag) => Ok(Filter::Resolved(tag)),
      None => Ok(Filter::Unmatched),
    }
  }

  async fn resolve(&self, taxonomy: Taxonomy, slug: &str) -> Result<Option<Tag>> {
    self
      .store
      .resolve_slug(taxonomy, slug)
      .await
      .map_err(store_err)
  }

  async fn list(&self, taxonomy: Taxonomy) -> Result<Vec<Tag>> {
    self.store.list_tags(taxonomy).await.map_err(store_err)
  }

  async fn search(&self, taxonomy: Taxonomy, text: &str) -> Result<Vec<Tag>> {
    self.store.search_tags(taxonomy, text).await.map_err(store_err)
  }

  async fn fetch(&self, filter: &RecordFilter) -> Result<Vec<fundlens_core::record::Record>> {
    self.store.fetch_records(filter).await.map_err(store_err)
  }

  /// The ids of `donors` plus all their transitive subsidiaries, deduped.
  async fn with_descendants(&self, donors: &[Tag]) -> Result<Vec<Uuid>> {
    let mut ids: Vec<Uuid> = donors.iter().map(|t| t.tag_id).collect();
    for donor in donors {
      let children =
        self.store.descendants(donor.tag_id).await.map_err(store_err)?;
      for child in children {
        if !ids.contains(&child.tag_id) {
          ids.push(child.tag_id);
        }
      }
    }
    Ok(ids)
  }

  async fn profiles_for(
    &self,
    recipients: &[Tag],
  ) -> Result<HashMap<Uuid, RecipientProfile>> {
    let mut profiles = HashMap::with_capacity(recipients.len());
    for recipient in recipients {
      if let Some(profile) =
        self.store.profile(recipient.tag_id).await.map_err(store_err)?
      {
        profiles.insert(recipient.tag_id, profile);
      }
    }
    Ok(profiles)
  }
}

fn tag_id(filter: &Filter) -> Option<Uuid> {
  match filter {
    Filter::Resolved(tag) => Some(tag.tag_id),
    _ => None,
  }
}

fn store_err<E>(e: E) -> EngineError
where
  E: std::error::Error + Send + Sync + 'static,
{
  EngineError::Store(Box::new(e))
}
