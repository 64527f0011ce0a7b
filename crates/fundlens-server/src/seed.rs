//! One-shot JSON seed import.
//!
//! The seed file references tags by slug so it can be written by hand;
//! ids are assigned by the store. Parent donors must appear before their
//! children. Tags that already exist are reused, so re-running an import
//! is safe for tags (records are always appended).

use std::{collections::HashMap, path::Path};

use anyhow::{Context as _, bail};
use fundlens_core::{
  profile::RecipientProfile,
  record::NewRecord,
  store::DonationStore,
  tag::{NewTag, Taxonomy},
};
use fundlens_store_sqlite::SqliteStore;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct SeedTag {
  taxonomy:     Taxonomy,
  slug:         String,
  display_name: String,
  #[serde(default)]
  parent:       Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeedRecord {
  recipient: String,
  donor:     String,
  #[serde(default)]
  categories: Vec<String>,
  year:      String,
  amount:    String,
  disclosed: bool,
  #[serde(default)]
  source:    Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeedProfile {
  recipient:          String,
  transparency_score: u8,
  #[serde(default)]
  declines:           Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SeedFile {
  #[serde(default)]
  tags:     Vec<SeedTag>,
  #[serde(default)]
  records:  Vec<SeedRecord>,
  #[serde(default)]
  profiles: Vec<SeedProfile>,
}

pub struct SeedSummary {
  pub tags:     usize,
  pub records:  usize,
  pub profiles: usize,
}

pub async fn import(store: &SqliteStore, path: &Path) -> anyhow::Result<SeedSummary> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read seed file {path:?}"))?;
  let seed: SeedFile =
    serde_json::from_str(&raw).context("failed to parse seed file")?;

  // Slug → id map, filled from existing tags and new inserts alike.
  let mut ids: HashMap<(Taxonomy, String), Uuid> = HashMap::new();

  let mut tags = 0;
  for tag in seed.tags {
    let existing = store.resolve_slug(tag.taxonomy, &tag.slug).await?;
    let id = match existing {
      Some(t) => t.tag_id,
      None => {
        let parent_id = match &tag.parent {
          Some(parent_slug) => Some(
            resolve(store, &ids, Taxonomy::Donor, parent_slug)
              .await
              .with_context(|| {
                format!("parent {parent_slug:?} of {:?} not found", tag.slug)
              })?,
          ),
          None => None,
        };
        tags += 1;
        store
          .add_tag(NewTag {
            taxonomy: tag.taxonomy,
            slug: tag.slug.clone(),
            display_name: tag.display_name,
            parent_id,
          })
          .await?
          .tag_id
      }
    };
    ids.insert((tag.taxonomy, tag.slug), id);
  }

  let mut records = 0;
  for record in seed.records {
    let mut category_ids = Vec::with_capacity(record.categories.len());
    for slug in &record.categories {
      category_ids.push(resolve(store, &ids, Taxonomy::Category, slug).await?);
    }
    store
      .add_record(NewRecord {
        recipient_id: resolve(store, &ids, Taxonomy::Recipient, &record.recipient).await?,
        donor_id: resolve(store, &ids, Taxonomy::Donor, &record.donor).await?,
        category_ids,
        year_id: resolve(store, &ids, Taxonomy::Year, &record.year).await?,
        amount: record.amount,
        disclosed: record.disclosed,
        source: record.source,
      })
      .await?;
    records += 1;
  }

  let mut profiles = 0;
  for profile in seed.profiles {
    store
      .set_profile(RecipientProfile {
        recipient_id: resolve(store, &ids, Taxonomy::Recipient, &profile.recipient).await?,
        transparency_score: profile.transparency_score,
        declines: profile.declines,
      })
      .await?;
    profiles += 1;
  }

  Ok(SeedSummary { tags, records, profiles })
}

async fn resolve(
  store: &SqliteStore,
  ids: &HashMap<(Taxonomy, String), Uuid>,
  taxonomy: Taxonomy,
  slug: &str,
) -> anyhow::Result<Uuid> {
  if let Some(id) = ids.get(&(taxonomy, slug.to_owned())) {
    return Ok(*id);
  }
  match store.resolve_slug(taxonomy, slug).await? {
    Some(tag) => Ok(tag.tag_id),
    None => bail!("unknown {} slug: {slug:?}", taxonomy.as_str()),
  }
}
