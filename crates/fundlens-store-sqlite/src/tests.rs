//! Integration tests for `SqliteStore` against an in-memory database.

use fundlens_core::{
  profile::RecipientProfile,
  record::NewRecord,
  store::{DonationStore, RecordFilter},
  tag::{NewTag, Tag, Taxonomy},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn tag(s: &SqliteStore, taxonomy: Taxonomy, slug: &str) -> Tag {
  s.add_tag(NewTag {
    taxonomy,
    slug: slug.into(),
    display_name: slug.replace('-', " "),
    parent_id: None,
  })
  .await
  .unwrap()
}

async fn child_tag(s: &SqliteStore, slug: &str, parent: &Tag) -> Tag {
  s.add_tag(NewTag {
    taxonomy: Taxonomy::Donor,
    slug: slug.into(),
    display_name: slug.replace('-', " "),
    parent_id: Some(parent.tag_id),
  })
  .await
  .unwrap()
}

fn record(
  recipient: &Tag,
  donor: &Tag,
  categories: &[&Tag],
  year: &Tag,
  amount: &str,
  disclosed: bool,
) -> NewRecord {
  NewRecord {
    recipient_id: recipient.tag_id,
    donor_id: donor.tag_id,
    category_ids: categories.iter().map(|t| t.tag_id).collect(),
    year_id: year.tag_id,
    amount: amount.into(),
    disclosed,
    source: None,
  }
}

// ─── Tags ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_resolve_slug() {
  let s = store().await;
  let rand = tag(&s, Taxonomy::Recipient, "rand").await;

  let found = s
    .resolve_slug(Taxonomy::Recipient, "rand")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(found.tag_id, rand.tag_id);
  assert_eq!(found.taxonomy, Taxonomy::Recipient);
}

#[tokio::test]
async fn resolve_slug_is_taxonomy_scoped() {
  let s = store().await;
  tag(&s, Taxonomy::Recipient, "acme").await;

  let miss = s.resolve_slug(Taxonomy::Donor, "acme").await.unwrap();
  assert!(miss.is_none());
}

#[tokio::test]
async fn resolve_unknown_slug_returns_none() {
  let s = store().await;
  let miss = s.resolve_slug(Taxonomy::Year, "1999").await.unwrap();
  assert!(miss.is_none());
}

#[tokio::test]
async fn list_tags_by_taxonomy() {
  let s = store().await;
  tag(&s, Taxonomy::Category, "pentagon").await;
  tag(&s, Taxonomy::Category, "foreign-government").await;
  tag(&s, Taxonomy::Recipient, "rand").await;

  let categories = s.list_tags(Taxonomy::Category).await.unwrap();
  assert_eq!(categories.len(), 2);
  assert!(categories.iter().all(|t| t.taxonomy == Taxonomy::Category));
}

#[tokio::test]
async fn search_tags_case_insensitive_partial() {
  let s = store().await;
  s.add_tag(NewTag {
    taxonomy: Taxonomy::Recipient,
    slug: "heritage".into(),
    display_name: "The Heritage Foundation".into(),
    parent_id: None,
  })
  .await
  .unwrap();
  tag(&s, Taxonomy::Recipient, "rand").await;

  let hits = s.search_tags(Taxonomy::Recipient, "HERIT").await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].slug, "heritage");

  // Display-name matching too.
  let hits = s.search_tags(Taxonomy::Recipient, "foundation").await.unwrap();
  assert_eq!(hits.len(), 1);
}

// ─── Hierarchy ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn ancestor_chain_of_root_is_itself() {
  let s = store().await;
  let acme = tag(&s, Taxonomy::Donor, "acme").await;

  let chain = s.ancestor_chain(acme.tag_id).await.unwrap();
  assert_eq!(chain.len(), 1);
  assert_eq!(chain[0].tag_id, acme.tag_id);
}

#[tokio::test]
async fn ancestor_chain_is_root_first() {
  let s = store().await;
  let acme = tag(&s, Taxonomy::Donor, "acme").await;
  let federal = child_tag(&s, "acme-federal", &acme).await;
  let skunk = child_tag(&s, "acme-federal-skunkworks", &federal).await;

  let chain = s.ancestor_chain(skunk.tag_id).await.unwrap();
  let slugs: Vec<_> = chain.iter().map(|t| t.slug.as_str()).collect();
  assert_eq!(slugs, ["acme", "acme-federal", "acme-federal-skunkworks"]);
}

#[tokio::test]
async fn ancestor_chain_unknown_tag_errors() {
  let s = store().await;
  let err = s.ancestor_chain(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, crate::Error::TagNotFound(_)));
}

#[tokio::test]
async fn descendants_are_transitive() {
  let s = store().await;
  let acme = tag(&s, Taxonomy::Donor, "acme").await;
  let federal = child_tag(&s, "acme-federal", &acme).await;
  let skunk = child_tag(&s, "acme-federal-skunkworks", &federal).await;
  tag(&s, Taxonomy::Donor, "globex").await;

  let mut slugs: Vec<_> = s
    .descendants(acme.tag_id)
    .await
    .unwrap()
    .into_iter()
    .map(|t| t.slug)
    .collect();
  slugs.sort();
  assert_eq!(slugs, ["acme-federal", "acme-federal-skunkworks"]);
  assert!(s.descendants(skunk.tag_id).await.unwrap().is_empty());
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn profile_roundtrip_and_replace() {
  let s = store().await;
  let rand = tag(&s, Taxonomy::Recipient, "rand").await;

  s.set_profile(RecipientProfile {
    recipient_id:       rand.tag_id,
    transparency_score: 4,
    declines:           vec!["tobacco".into()],
  })
  .await
  .unwrap();

  let p = s.profile(rand.tag_id).await.unwrap().unwrap();
  assert_eq!(p.transparency_score, 4);
  assert!(p.declines_category("tobacco"));

  // set_profile is an upsert.
  s.set_profile(RecipientProfile {
    recipient_id:       rand.tag_id,
    transparency_score: 2,
    declines:           vec![],
  })
  .await
  .unwrap();
  let p = s.profile(rand.tag_id).await.unwrap().unwrap();
  assert_eq!(p.transparency_score, 2);
  assert!(p.declines.is_empty());
}

#[tokio::test]
async fn missing_profile_is_none() {
  let s = store().await;
  assert!(s.profile(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_record_resolves_chain_and_amount() {
  let s = store().await;
  let rand = tag(&s, Taxonomy::Recipient, "rand").await;
  let acme = tag(&s, Taxonomy::Donor, "acme").await;
  let federal = child_tag(&s, "acme-federal", &acme).await;
  let pentagon = tag(&s, Taxonomy::Category, "pentagon").await;
  let y2019 = tag(&s, Taxonomy::Year, "2019").await;

  let rec = s
    .add_record(record(&rand, &federal, &[&pentagon], &y2019, "1,500,000", true))
    .await
    .unwrap();

  assert_eq!(rec.amount, 1_500_000);
  let chain: Vec<_> = rec.donor_chain.iter().map(|t| t.slug.as_str()).collect();
  assert_eq!(chain, ["acme", "acme-federal"]);
  assert_eq!(rec.categories.len(), 1);
}

#[tokio::test]
async fn fetch_with_no_filter_returns_everything() {
  let s = store().await;
  let rand = tag(&s, Taxonomy::Recipient, "rand").await;
  let acme = tag(&s, Taxonomy::Donor, "acme").await;
  let y2019 = tag(&s, Taxonomy::Year, "2019").await;

  s.add_record(record(&rand, &acme, &[], &y2019, "100", true))
    .await
    .unwrap();
  s.add_record(record(&rand, &acme, &[], &y2019, "", false))
    .await
    .unwrap();

  let all = s.fetch_records(&RecordFilter::default()).await.unwrap();
  assert_eq!(all.len(), 2);

  // Lenient amount parse: empty string becomes 0.
  let undisclosed = all.iter().find(|r| !r.disclosed).unwrap();
  assert_eq!(undisclosed.amount, 0);
}

#[tokio::test]
async fn fetch_empty_store_is_empty_not_error() {
  let s = store().await;
  let all = s.fetch_records(&RecordFilter::default()).await.unwrap();
  assert!(all.is_empty());
}

#[tokio::test]
async fn fetch_filters_and_combine() {
  let s = store().await;
  let rand = tag(&s, Taxonomy::Recipient, "rand").await;
  let brookings = tag(&s, Taxonomy::Recipient, "brookings").await;
  let acme = tag(&s, Taxonomy::Donor, "acme").await;
  let pentagon = tag(&s, Taxonomy::Category, "pentagon").await;
  let y2019 = tag(&s, Taxonomy::Year, "2019").await;
  let y2020 = tag(&s, Taxonomy::Year, "2020").await;

  s.add_record(record(&rand, &acme, &[&pentagon], &y2019, "100", true))
    .await
    .unwrap();
  s.add_record(record(&rand, &acme, &[], &y2020, "200", true))
    .await
    .unwrap();
  s.add_record(record(&brookings, &acme, &[&pentagon], &y2019, "300", true))
    .await
    .unwrap();

  let filter = RecordFilter {
    recipients: vec![rand.tag_id],
    year: Some(y2019.tag_id),
    ..Default::default()
  };
  let hits = s.fetch_records(&filter).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].amount, 100);

  let filter = RecordFilter {
    category: Some(pentagon.tag_id),
    ..Default::default()
  };
  let hits = s.fetch_records(&filter).await.unwrap();
  assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn fetch_donors_are_or_combined() {
  let s = store().await;
  let rand = tag(&s, Taxonomy::Recipient, "rand").await;
  let acme = tag(&s, Taxonomy::Donor, "acme").await;
  let federal = child_tag(&s, "acme-federal", &acme).await;
  let globex = tag(&s, Taxonomy::Donor, "globex").await;
  let y2019 = tag(&s, Taxonomy::Year, "2019").await;

  s.add_record(record(&rand, &acme, &[], &y2019, "1", true))
    .await
    .unwrap();
  s.add_record(record(&rand, &federal, &[], &y2019, "2", true))
    .await
    .unwrap();
  s.add_record(record(&rand, &globex, &[], &y2019, "4", true))
    .await
    .unwrap();

  let filter = RecordFilter {
    donors: vec![acme.tag_id, federal.tag_id],
    ..Default::default()
  };
  let hits = s.fetch_records(&filter).await.unwrap();
  let total: i64 = hits.iter().map(|r| r.amount).sum();
  assert_eq!(hits.len(), 2);
  assert_eq!(total, 3);
}

#[tokio::test]
async fn fetched_records_carry_resolved_chains() {
  let s = store().await;
  let rand = tag(&s, Taxonomy::Recipient, "rand").await;
  let acme = tag(&s, Taxonomy::Donor, "acme").await;
  let federal = child_tag(&s, "acme-federal", &acme).await;
  let y2019 = tag(&s, Taxonomy::Year, "2019").await;

  s.add_record(record(&rand, &federal, &[], &y2019, "10", true))
    .await
    .unwrap();

  let all = s.fetch_records(&RecordFilter::default()).await.unwrap();
  let chain: Vec<_> =
    all[0].donor_chain.iter().map(|t| t.slug.as_str()).collect();
  assert_eq!(chain, ["acme", "acme-federal"]);
  assert_eq!(all[0].root_donor().unwrap().slug, "acme");
  assert_eq!(all[0].leaf_donor().unwrap().slug, "acme-federal");
}
