//! [`SqliteStore`] — the SQLite implementation of [`DonationStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use fundlens_core::{
  profile::RecipientProfile,
  record::{NewRecord, Record, parse_amount},
  store::{DonationStore, RecordFilter},
  tag::{NewTag, Tag, Taxonomy},
};

use crate::{
  Error, Result,
  encode::{
    RawProfile, RawRecord, RawTag, encode_declines, encode_dt, encode_taxonomy,
    encode_uuid,
  },
  schema::SCHEMA,
};

/// Maximum donor-hierarchy depth tolerated before a parent walk is treated
/// as a data error. Real corporate trees are at most a few levels deep.
const MAX_DONOR_DEPTH: usize = 8;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Fundlens donation store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch a single tag by id, erroring if it does not exist.
  async fn get_tag(&self, id: Uuid) -> Result<Tag> {
    let id_str = encode_uuid(id);

    let raw: Option<RawTag> = self
      .conn
      .call(move |conn| Ok(tag_row(conn, &id_str)?))
      .await?;

    match raw {
      Some(raw) => raw.into_tag(),
      None => Err(Error::TagNotFound(id)),
    }
  }
}

// ─── Sync helpers (run inside connection closures) ───────────────────────────

fn tag_row(
  conn: &rusqlite::Connection,
  id: &str,
) -> rusqlite::Result<Option<RawTag>> {
  conn
    .query_row(
      "SELECT tag_id, taxonomy, slug, display_name, parent_id
       FROM tags WHERE tag_id = ?1",
      rusqlite::params![id],
      |row| {
        Ok(RawTag {
          tag_id:       row.get(0)?,
          taxonomy:     row.get(1)?,
          slug:         row.get(2)?,
          display_name: row.get(3)?,
          parent_id:    row.get(4)?,
        })
      },
    )
    .optional()
}

/// Walk parent pointers from `leaf_id` up to the root, capped at
/// [`MAX_DONOR_DEPTH`]. Returns `(tag_exists, chain)` where `chain` is
/// root-first and `None` when the walk hit the cap.
fn walk_chain(
  conn: &rusqlite::Connection,
  leaf_id: &str,
) -> rusqlite::Result<(bool, Option<Vec<RawTag>>)> {
  let mut chain: Vec<RawTag> = Vec::new();
  let mut current = Some(leaf_id.to_owned());

  while let Some(id) = current {
    if chain.len() >= MAX_DONOR_DEPTH {
      return Ok((true, None));
    }
    let Some(raw) = tag_row(conn, &id)? else {
      // Leaf itself missing, or a dangling parent pointer mid-walk.
      return Ok((!chain.is_empty(), None));
    };
    current = raw.parent_id.clone();
    chain.push(raw);
  }

  chain.reverse();
  Ok((true, Some(chain)))
}

fn placeholders(n: usize) -> String { vec!["?"; n].join(",") }

/// One fetched record row with every tag reference pulled alongside it.
struct FetchedRow {
  record:      RawRecord,
  recipient:   Option<RawTag>,
  year:        Option<RawTag>,
  categories:  Vec<RawTag>,
  /// `None` when the donor chain could not be resolved (missing tag or
  /// depth cap). The engine drops such records.
  donor_chain: Option<Vec<RawTag>>,
}

// ─── DonationStore impl ──────────────────────────────────────────────────────

impl DonationStore for SqliteStore {
  type Error = Error;

  // ── Seed writes ───────────────────────────────────────────────────────────

  async fn add_tag(&self, input: NewTag) -> Result<Tag> {
    let tag = Tag {
      tag_id:       Uuid::new_v4(),
      taxonomy:     input.taxonomy,
      slug:         input.slug,
      display_name: input.display_name,
      parent_id:    input.parent_id,
    };

    let id_str       = encode_uuid(tag.tag_id);
    let taxonomy_str = encode_taxonomy(tag.taxonomy).to_owned();
    let slug         = tag.slug.clone();
    let display_name = tag.display_name.clone();
    let parent_str   = tag.parent_id.map(encode_uuid);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tags (tag_id, taxonomy, slug, display_name, parent_id)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, taxonomy_str, slug, display_name, parent_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(tag)
  }

  async fn add_record(&self, input: NewRecord) -> Result<Record> {
    // Resolve every tag reference up front so a bad id fails the whole
    // insert rather than leaving a half-usable record behind.
    let recipient   = self.get_tag(input.recipient_id).await?;
    let donor_chain = self.ancestor_chain(input.donor_id).await?;
    let year        = self.get_tag(input.year_id).await?;

    let mut categories = Vec::with_capacity(input.category_ids.len());
    for id in &input.category_ids {
      categories.push(self.get_tag(*id).await?);
    }

    let record_id   = Uuid::new_v4();
    let recorded_at = Utc::now();

    let record_id_str    = encode_uuid(record_id);
    let recipient_id_str = encode_uuid(input.recipient_id);
    let donor_id_str     = encode_uuid(input.donor_id);
    let year_id_str      = encode_uuid(input.year_id);
    let amount_raw       = input.amount.clone();
    let disclosed        = input.disclosed;
    let source           = input.source.clone();
    let recorded_at_str  = encode_dt(recorded_at);
    let category_id_strs: Vec<String> =
      input.category_ids.iter().copied().map(encode_uuid).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO records (
             record_id, recipient_id, donor_id, year_id,
             amount, disclosed, source, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            record_id_str,
            recipient_id_str,
            donor_id_str,
            year_id_str,
            amount_raw,
            disclosed,
            source,
            recorded_at_str,
          ],
        )?;
        for cat in &category_id_strs {
          tx.execute(
            "INSERT INTO record_categories (record_id, tag_id) VALUES (?1, ?2)",
            rusqlite::params![record_id_str, cat],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(Record {
      record_id,
      recipient,
      donor_chain,
      categories,
      year,
      amount: parse_amount(&input.amount),
      disclosed: input.disclosed,
      source: input.source,
      recorded_at,
    })
  }

  async fn set_profile(&self, profile: RecipientProfile) -> Result<()> {
    let id_str       = encode_uuid(profile.recipient_id);
    let score        = i64::from(profile.transparency_score.min(5));
    let declines_str = encode_declines(&profile.declines)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (recipient_id, transparency_score, declines)
           VALUES (?1, ?2, ?3)
           ON CONFLICT(recipient_id) DO UPDATE SET
             transparency_score = excluded.transparency_score,
             declines           = excluded.declines",
          rusqlite::params![id_str, score, declines_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Tag resolution ──────────────────────────────────────────────────────────

  async fn resolve_slug(&self, taxonomy: Taxonomy, slug: &str) -> Result<Option<Tag>> {
    let taxonomy_str = encode_taxonomy(taxonomy).to_owned();
    let slug = slug.to_owned();

    let raw: Option<RawTag> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT tag_id, taxonomy, slug, display_name, parent_id
               FROM tags WHERE taxonomy = ?1 AND slug = ?2",
              rusqlite::params![taxonomy_str, slug],
              |row| {
                Ok(RawTag {
                  tag_id:       row.get(0)?,
                  taxonomy:     row.get(1)?,
                  slug:         row.get(2)?,
                  display_name: row.get(3)?,
                  parent_id:    row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTag::into_tag).transpose()
  }

  async fn list_tags(&self, taxonomy: Taxonomy) -> Result<Vec<Tag>> {
    let taxonomy_str = encode_taxonomy(taxonomy).to_owned();

    let raws: Vec<RawTag> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT tag_id, taxonomy, slug, display_name, parent_id
           FROM tags WHERE taxonomy = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![taxonomy_str], |row| {
            Ok(RawTag {
              tag_id:       row.get(0)?,
              taxonomy:     row.get(1)?,
              slug:         row.get(2)?,
              display_name: row.get(3)?,
              parent_id:    row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTag::into_tag).collect()
  }

  async fn search_tags(&self, taxonomy: Taxonomy, text: &str) -> Result<Vec<Tag>> {
    let taxonomy_str = encode_taxonomy(taxonomy).to_owned();
    let pattern = format!("%{}%", text.to_lowercase());

    let raws: Vec<RawTag> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT tag_id, taxonomy, slug, display_name, parent_id
           FROM tags
           WHERE taxonomy = ?1
             AND (LOWER(slug) LIKE ?2 OR LOWER(display_name) LIKE ?2)",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![taxonomy_str, pattern], |row| {
            Ok(RawTag {
              tag_id:       row.get(0)?,
              taxonomy:     row.get(1)?,
              slug:         row.get(2)?,
              display_name: row.get(3)?,
              parent_id:    row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTag::into_tag).collect()
  }

  async fn ancestor_chain(&self, tag_id: Uuid) -> Result<Vec<Tag>> {
    let id_str = encode_uuid(tag_id);

    let (exists, chain): (bool, Option<Vec<RawTag>>) = self
      .conn
      .call(move |conn| Ok(walk_chain(conn, &id_str)?))
      .await?;

    if !exists {
      return Err(Error::TagNotFound(tag_id));
    }
    let Some(chain) = chain else {
      return Err(Error::DepthCapExceeded(tag_id));
    };
    chain.into_iter().map(RawTag::into_tag).collect()
  }

  async fn descendants(&self, tag_id: Uuid) -> Result<Vec<Tag>> {
    let id_str = encode_uuid(tag_id);

    let raws: Vec<RawTag> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT tag_id, taxonomy, slug, display_name, parent_id
           FROM tags WHERE parent_id = ?1",
        )?;

        let mut result: Vec<RawTag> = Vec::new();
        let mut frontier = vec![id_str];

        // Breadth-first, bounded by the same depth cap as the parent walk.
        for _ in 0..MAX_DONOR_DEPTH {
          if frontier.is_empty() {
            break;
          }
          let mut next = Vec::new();
          for parent in &frontier {
            let children = stmt
              .query_map(rusqlite::params![parent], |row| {
                Ok(RawTag {
                  tag_id:       row.get(0)?,
                  taxonomy:     row.get(1)?,
                  slug:         row.get(2)?,
                  display_name: row.get(3)?,
                  parent_id:    row.get(4)?,
                })
              })?
              .collect::<rusqlite::Result<Vec<_>>>()?;
            for child in children {
              next.push(child.tag_id.clone());
              result.push(child);
            }
          }
          frontier = next;
        }

        Ok(result)
      })
      .await?;

    raws.into_iter().map(RawTag::into_tag).collect()
  }

  // ── Profiles ────────────────────────────────────────────────────────────────

  async fn profile(&self, recipient_id: Uuid) -> Result<Option<RecipientProfile>> {
    let id_str = encode_uuid(recipient_id);

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT recipient_id, transparency_score, declines
               FROM profiles WHERE recipient_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawProfile {
                  recipient_id:       row.get(0)?,
                  transparency_score: row.get(1)?,
                  declines:           row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  // ── Records ─────────────────────────────────────────────────────────────────

  async fn fetch_records(&self, filter: &RecordFilter) -> Result<Vec<Record>> {
    let recipient_ids: Vec<String> =
      filter.recipients.iter().copied().map(encode_uuid).collect();
    let donor_ids: Vec<String> =
      filter.donors.iter().copied().map(encode_uuid).collect();
    let category_id = filter.category.map(encode_uuid);
    let year_id = filter.year.map(encode_uuid);

    let rows: Vec<FetchedRow> = self
      .conn
      .call(move |conn| {
        // Build WHERE clause dynamically; ids OR within a dimension, AND
        // across dimensions.
        let mut conds: Vec<String> = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if !recipient_ids.is_empty() {
          conds.push(format!(
            "r.recipient_id IN ({})",
            placeholders(recipient_ids.len())
          ));
          params.extend(recipient_ids.iter().cloned());
        }
        if !donor_ids.is_empty() {
          conds.push(format!("r.donor_id IN ({})", placeholders(donor_ids.len())));
          params.extend(donor_ids.iter().cloned());
        }
        if let Some(cat) = &category_id {
          conds.push(
            "EXISTS (SELECT 1 FROM record_categories rc
              WHERE rc.record_id = r.record_id AND rc.tag_id = ?)"
              .to_owned(),
          );
          params.push(cat.clone());
        }
        if let Some(y) = &year_id {
          conds.push("r.year_id = ?".to_owned());
          params.push(y.clone());
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT r.record_id, r.recipient_id, r.donor_id, r.year_id,
                  r.amount, r.disclosed, r.source, r.recorded_at
           FROM records r
           {where_clause}"
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut raws = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok(RawRecord {
              record_id:    row.get(0)?,
              recipient_id: row.get(1)?,
              donor_id:     row.get(2)?,
              year_id:      row.get(3)?,
              amount:       row.get(4)?,
              disclosed:    row.get(5)?,
              source:       row.get(6)?,
              recorded_at:  row.get(7)?,
              category_ids: Vec::new(),
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut cat_stmt = conn.prepare(
          "SELECT t.tag_id, t.taxonomy, t.slug, t.display_name, t.parent_id
           FROM record_categories rc
           JOIN tags t ON t.tag_id = rc.tag_id
           WHERE rc.record_id = ?1",
        )?;

        let mut fetched = Vec::with_capacity(raws.len());
        for raw in raws.drain(..) {
          let categories = cat_stmt
            .query_map(rusqlite::params![raw.record_id], |row| {
              Ok(RawTag {
                tag_id:       row.get(0)?,
                taxonomy:     row.get(1)?,
                slug:         row.get(2)?,
                display_name: row.get(3)?,
                parent_id:    row.get(4)?,
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

          let recipient = tag_row(conn, &raw.recipient_id)?;
          let year = tag_row(conn, &raw.year_id)?;
          let (_, donor_chain) = walk_chain(conn, &raw.donor_id)?;

          fetched.push(FetchedRow { record: raw, recipient, year, categories, donor_chain });
        }

        Ok(fetched)
      })
      .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
      // A record whose recipient or year tag has vanished is unusable;
      // return it with what we have and let the engine's drop policy
      // apply via the empty donor chain. Missing recipient/year rows
      // cannot be represented at all, so they are skipped here.
      let (Some(recipient), Some(year)) = (row.recipient, row.year) else {
        continue;
      };

      let donor_chain = row
        .donor_chain
        .map(|chain| chain.into_iter().map(RawTag::into_tag).collect::<Result<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();

      records.push(Record {
        record_id:   crate::encode::decode_uuid(&row.record.record_id)?,
        recipient:   recipient.into_tag()?,
        donor_chain,
        categories:  row
          .categories
          .into_iter()
          .map(RawTag::into_tag)
          .collect::<Result<Vec<_>>>()?,
        year:        year.into_tag()?,
        amount:      parse_amount(&row.record.amount),
        disclosed:   row.record.disclosed,
        source:      row.record.source,
        recorded_at: crate::encode::decode_dt(&row.record.recorded_at)?,
      });
    }

    Ok(records)
  }
}
