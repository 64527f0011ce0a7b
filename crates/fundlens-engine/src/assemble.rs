//! Report assembly — turning group rows into column-complete tables.
//!
//! The assembler guarantees that every row carries a value for every column
//! and that two assemblies of identical inputs produce identical tables
//! (same row order, same cell values).

use std::collections::HashMap;

use fundlens_core::{
  profile::RecipientProfile,
  report::{Cell, Column, ReportTable, Row},
  tag::Tag,
};
use uuid::Uuid;

use crate::aggregate::{Accum, GroupRow, MatrixRow};

// ─── Column sets ─────────────────────────────────────────────────────────────

/// Columns for the recipient archive: recipient, one column per category in
/// the *entire* category taxonomy (sorted by slug), and the transparency
/// score. A recipient with zero donations from a category still shows a `0`
/// cell, distinguishing "confirmed zero" from "unknown".
pub fn recipient_archive_columns(categories: &[Tag]) -> Vec<Column> {
  let mut sorted: Vec<&Tag> = categories.iter().collect();
  sorted.sort_by(|a, b| a.slug.cmp(&b.slug));

  let mut columns = vec![Column::text("recipient", "Recipient")];
  columns.extend(
    sorted
      .iter()
      .map(|t| Column::numeric(t.slug.clone(), t.display_name.clone())),
  );
  columns.push(Column::numeric("transparency", "Transparency"));
  columns
}

pub fn donor_archive_columns() -> Vec<Column> {
  vec![
    Column::text("donor", "Donor"),
    Column::numeric("total", "Total"),
    Column::text("years", "Years"),
  ]
}

pub fn single_recipient_columns() -> Vec<Column> {
  vec![
    Column::text("donor", "Donor"),
    Column::numeric("total", "Total"),
    Column::text("years", "Years"),
    Column::text("source", "Source"),
  ]
}

pub fn single_donor_columns() -> Vec<Column> {
  vec![
    Column::text("recipient", "Recipient"),
    Column::numeric("total", "Total"),
    Column::text("years", "Years"),
    Column::text("source", "Source"),
  ]
}

pub fn top_recipients_columns() -> Vec<Column> {
  vec![
    Column::text("recipient", "Recipient"),
    Column::numeric("total", "Total"),
  ]
}

// ─── Cell policy ─────────────────────────────────────────────────────────────

/// Disclosure dominance: a tainted accumulator displays as `Unknown`, never
/// as its (still computed) partial sum.
fn total_cell(accum: &Accum) -> Cell {
  if accum.undisclosed {
    Cell::Unknown
  } else {
    Cell::Amount(accum.sum)
  }
}

fn years_cell(years: &[Tag]) -> Cell {
  Cell::Text(
    years
      .iter()
      .map(|y| y.display_name.as_str())
      .collect::<Vec<_>>()
      .join(", "),
  )
}

fn source_cell(source: &Option<String>) -> Cell {
  Cell::Text(source.clone().unwrap_or_default())
}

// ─── Tables ──────────────────────────────────────────────────────────────────

/// Assemble the recipient archive from its cross-tab matrix.
///
/// `profiles` supplies the static enrichment: the transparency score column
/// and the `Declined` marker for categories a recipient refuses with no
/// contradicting record.
pub fn recipient_archive_table(
  matrix: &[MatrixRow],
  categories: &[Tag],
  profiles: &HashMap<Uuid, RecipientProfile>,
) -> ReportTable {
  let columns = recipient_archive_columns(categories);

  let rows: Vec<Row> = matrix
    .iter()
    .map(|m| {
      let profile = profiles.get(&m.recipient.tag_id);
      let mut row = Row::new();
      row.insert(
        "recipient".to_owned(),
        Cell::Text(m.recipient.display_name.clone()),
      );
      for category in categories {
        let cell = match m.cells.get(&category.tag_id) {
          Some(accum) => total_cell(accum),
          None => {
            let declines = profile
              .is_some_and(|p| p.declines_category(&category.slug));
            if declines { Cell::Declined } else { Cell::Amount(0) }
          }
        };
        row.insert(category.slug.clone(), cell);
      }
      row.insert(
        "transparency".to_owned(),
        Cell::Score(profile.map_or(0, |p| p.transparency_score)),
      );
      row
    })
    .collect();

  let found_records = rows.len();
  ReportTable { columns, rows, found_records }
}

/// Assemble one of the group-list shapes. `label_key` names the entity
/// column; `with_source` adds the per-group representative source link
/// (single-entity reports only, never archives).
fn group_table(
  columns: Vec<Column>,
  label_key: &str,
  groups: &[GroupRow],
  with_years: bool,
  with_source: bool,
) -> ReportTable {
  let rows: Vec<Row> = groups
    .iter()
    .map(|g| {
      let mut row = Row::new();
      row.insert(label_key.to_owned(), Cell::Text(g.label.clone()));
      row.insert("total".to_owned(), total_cell(&g.accum));
      if with_years {
        row.insert("years".to_owned(), years_cell(&g.years));
      }
      if with_source {
        row.insert("source".to_owned(), source_cell(&g.source));
      }
      row
    })
    .collect();

  let found_records = rows.len();
  ReportTable { columns, rows, found_records }
}

pub fn donor_archive_table(groups: &[GroupRow]) -> ReportTable {
  group_table(donor_archive_columns(), "donor", groups, true, false)
}

pub fn single_recipient_table(groups: &[GroupRow]) -> ReportTable {
  group_table(single_recipient_columns(), "donor", groups, true, true)
}

pub fn single_donor_table(groups: &[GroupRow]) -> ReportTable {
  group_table(single_donor_columns(), "recipient", groups, true, true)
}

pub fn top_recipients_table(groups: &[GroupRow]) -> ReportTable {
  group_table(top_recipients_columns(), "recipient", groups, false, false)
}
