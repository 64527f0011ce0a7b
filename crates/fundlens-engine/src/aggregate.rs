//! Grouping and summing — the algorithmic core.
//!
//! Every function here is pure and synchronous: it takes the fetched record
//! set (in whatever order the store returned it) and produces sorted group
//! rows. Records whose donor chain failed to resolve are dropped here, with
//! a warning, never an error.

use std::collections::HashMap;

use fundlens_core::{record::Record, tag::Tag};
use uuid::Uuid;

// ─── Accumulators ────────────────────────────────────────────────────────────

/// Running total for one cell or group.
///
/// The sum keeps accumulating after the first undisclosed contribution —
/// the exact figure is still useful for ranking — but a tainted accumulator
/// must never be displayed as a number.
#[derive(Debug, Default, Clone)]
pub struct Accum {
  pub sum:         i64,
  pub undisclosed: bool,
}

impl Accum {
  pub fn add(&mut self, record: &Record) {
    if record.disclosed {
      self.sum += record.amount;
    } else {
      self.undisclosed = true;
    }
  }
}

// ─── Group rows ──────────────────────────────────────────────────────────────

/// One aggregation group, keyed by a single dimension value.
#[derive(Debug, Clone)]
pub struct GroupRow {
  /// Stable sort key: a slug, or a `/`-joined slug path for donor chains.
  pub key:    String,
  /// Human-facing label: a display name, or a `>`-joined chain.
  pub label:  String,
  pub accum:  Accum,
  /// Contributing years, deduplicated, in order of first appearance.
  pub years:  Vec<Tag>,
  /// One representative source URL — the first encountered in fetch order.
  /// Distinct sources within a group are never merged.
  pub source: Option<String>,
}

/// One recipient-archive row: a recipient crossed with per-category cells.
#[derive(Debug)]
pub struct MatrixRow {
  pub recipient: Tag,
  /// Keyed by category tag id. Absent key = no contributions at all,
  /// which is different from a present accumulator summing to zero.
  pub cells:     HashMap<Uuid, Accum>,
}

// ─── Record hygiene ──────────────────────────────────────────────────────────

/// Filter out records that reached the aggregator without a resolvable
/// donor chain. Defensive: such records are dropped silently and logged,
/// never raised to the caller.
fn usable(records: &[Record]) -> impl Iterator<Item = &Record> {
  records.iter().filter(|r| {
    if r.donor_chain.is_empty() {
      tracing::warn!(record_id = %r.record_id, "dropping record with unresolvable donor chain");
      false
    } else {
      true
    }
  })
}

fn push_year(years: &mut Vec<Tag>, year: &Tag) {
  if !years.iter().any(|y| y.tag_id == year.tag_id) {
    years.push(year.clone());
  }
}

// ─── Recipient archive ───────────────────────────────────────────────────────

/// Cross-tabulate records into one row per recipient in `recipients` —
/// including recipients with zero matching records, which keep an empty
/// cell map. Sorted by recipient slug ascending.
pub fn group_recipient_matrix(
  recipients: &[Tag],
  records: &[Record],
) -> Vec<MatrixRow> {
  let mut rows: Vec<MatrixRow> = recipients
    .iter()
    .map(|t| MatrixRow { recipient: t.clone(), cells: HashMap::new() })
    .collect();
  rows.sort_by(|a, b| a.recipient.slug.cmp(&b.recipient.slug));

  let index: HashMap<Uuid, usize> = rows
    .iter()
    .enumerate()
    .map(|(i, row)| (row.recipient.tag_id, i))
    .collect();

  for record in usable(records) {
    let Some(&i) = index.get(&record.recipient.tag_id) else {
      // Record for a recipient outside the requested universe (e.g. a
      // search-narrowed archive); not an error.
      continue;
    };
    for category in &record.categories {
      rows[i].cells.entry(category.tag_id).or_default().add(record);
    }
  }

  rows
}

// ─── Donor archive ───────────────────────────────────────────────────────────

/// Group by root donor ancestor: `"Acme"` and `"Acme > Acme Federal"`
/// merge into one row keyed by `"acme"`. Sorted by root donor slug.
pub fn group_by_root_donor(records: &[Record]) -> Vec<GroupRow> {
  let mut groups: HashMap<Uuid, GroupRow> = HashMap::new();

  for record in usable(records) {
    let Some(root) = record.root_donor() else { continue };
    let group = groups.entry(root.tag_id).or_insert_with(|| GroupRow {
      key:    root.slug.clone(),
      label:  root.display_name.clone(),
      accum:  Accum::default(),
      years:  Vec::new(),
      source: None,
    });
    group.accum.add(record);
    push_year(&mut group.years, &record.year);
  }

  sorted_by_key(groups)
}

// ─── Single recipient ────────────────────────────────────────────────────────

/// Group by full donor chain (leaf-specific identity): a subsidiary is a
/// distinct row from its parent. Sorted by the `/`-joined chain slug path.
pub fn group_by_donor_chain(records: &[Record]) -> Vec<GroupRow> {
  let mut groups: HashMap<Uuid, GroupRow> = HashMap::new();

  for record in usable(records) {
    let Some(leaf) = record.leaf_donor() else { continue };
    let group = groups.entry(leaf.tag_id).or_insert_with(|| GroupRow {
      key:    chain_key(&record.donor_chain),
      label:  chain_label(&record.donor_chain),
      accum:  Accum::default(),
      years:  Vec::new(),
      source: None,
    });
    group.accum.add(record);
    push_year(&mut group.years, &record.year);
    if group.source.is_none() {
      group.source = record.source.clone();
    }
  }

  sorted_by_key(groups)
}

fn chain_key(chain: &[Tag]) -> String {
  chain
    .iter()
    .map(|t| t.slug.as_str())
    .collect::<Vec<_>>()
    .join("/")
}

fn chain_label(chain: &[Tag]) -> String {
  chain
    .iter()
    .map(|t| t.display_name.as_str())
    .collect::<Vec<_>>()
    .join(" > ")
}

// ─── Single donor / top-N ────────────────────────────────────────────────────

/// Group by recipient. Sorted by recipient slug ascending.
pub fn group_by_recipient(records: &[Record]) -> Vec<GroupRow> {
  sorted_by_key(recipient_groups(records))
}

/// Group by recipient, rank by disclosed sum descending, tie-break by
/// recipient slug ascending, truncate to `limit`.
pub fn rank_recipients(records: &[Record], limit: usize) -> Vec<GroupRow> {
  let mut rows: Vec<GroupRow> =
    recipient_groups(records).into_values().collect();
  rows.sort_by(|a, b| {
    b.accum
      .sum
      .cmp(&a.accum.sum)
      .then_with(|| a.key.cmp(&b.key))
  });
  rows.truncate(limit);
  rows
}

fn recipient_groups(records: &[Record]) -> HashMap<Uuid, GroupRow> {
  let mut groups: HashMap<Uuid, GroupRow> = HashMap::new();

  for record in usable(records) {
    let group = groups
      .entry(record.recipient.tag_id)
      .or_insert_with(|| GroupRow {
        key:    record.recipient.slug.clone(),
        label:  record.recipient.display_name.clone(),
        accum:  Accum::default(),
        years:  Vec::new(),
        source: None,
      });
    group.accum.add(record);
    push_year(&mut group.years, &record.year);
    if group.source.is_none() {
      group.source = record.source.clone();
    }
  }

  groups
}

fn sorted_by_key(groups: HashMap<Uuid, GroupRow>) -> Vec<GroupRow> {
  let mut rows: Vec<GroupRow> = groups.into_values().collect();
  rows.sort_by(|a, b| a.key.cmp(&b.key));
  rows
}
