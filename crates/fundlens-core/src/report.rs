//! The tabular output contract consumed by renderers.
//!
//! A [`ReportTable`] is constructed fresh per request (or retrieved from
//! cache) and discarded after serialisation; no aggregation state survives
//! a request outside the cache.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

// ─── Cells ───────────────────────────────────────────────────────────────────

/// A single table cell.
///
/// Disclosure dominance: once any undisclosed record contributes to a cell
/// the cell is [`Cell::Unknown`], even if other contributions are disclosed
/// and numeric. The underlying sum is still computed by the aggregator but
/// must never be displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
  /// An exact summed amount in minor units. `Amount(0)` means "confirmed
  /// zero", which is distinct from [`Cell::Unknown`].
  Amount(i64),
  /// A transparency score, 0..=5.
  Score(u8),
  Text(String),
  /// At least one contributing record has an undisclosed amount.
  Unknown,
  /// The recipient declares it declines this category and no record
  /// contradicts that.
  Declined,
}

impl Serialize for Cell {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Cell::Amount(n) => serializer.serialize_i64(*n),
      Cell::Score(n) => serializer.serialize_u8(*n),
      Cell::Text(s) => serializer.serialize_str(s),
      Cell::Unknown => serializer.serialize_str("unknown"),
      Cell::Declined => serializer.serialize_str("declined"),
    }
  }
}

// ─── Columns ─────────────────────────────────────────────────────────────────

/// One column of a report table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
  /// Stable key the row dictionaries are indexed by.
  pub key:     String,
  /// Human-facing header text.
  pub title:   String,
  /// Whether the column holds summed amounts (renderers right-align these).
  pub numeric: bool,
}

impl Column {
  pub fn text(key: impl Into<String>, title: impl Into<String>) -> Self {
    Self { key: key.into(), title: title.into(), numeric: false }
  }

  pub fn numeric(key: impl Into<String>, title: impl Into<String>) -> Self {
    Self { key: key.into(), title: title.into(), numeric: true }
  }
}

// ─── Table ───────────────────────────────────────────────────────────────────

/// A row keyed by column key. Every column has an entry — no sparse rows.
pub type Row = BTreeMap<String, Cell>;

/// The normalised tabular result of one report request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTable {
  pub columns:       Vec<Column>,
  pub rows:          Vec<Row>,
  /// Number of result rows — not the number of underlying transaction
  /// records. Consumed for "N records found" display.
  pub found_records: usize,
}

impl ReportTable {
  /// An empty table that still carries its full column header set.
  pub fn empty(columns: Vec<Column>) -> Self {
    Self { columns, rows: Vec::new(), found_records: 0 }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cells_serialise_to_numbers_and_markers() {
    let json = serde_json::to_string(&vec![
      Cell::Amount(1500),
      Cell::Amount(0),
      Cell::Score(4),
      Cell::Unknown,
      Cell::Declined,
      Cell::Text("Acme".into()),
    ])
    .unwrap();
    assert_eq!(json, r#"[1500,0,4,"unknown","declined","Acme"]"#);
  }

  #[test]
  fn empty_table_keeps_columns() {
    let table = ReportTable::empty(vec![
      Column::text("donor", "Donor"),
      Column::numeric("total", "Total"),
    ]);
    assert_eq!(table.found_records, 0);
    assert_eq!(table.columns.len(), 2);
  }
}
