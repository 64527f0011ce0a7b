//! SQL schema for the Fundlens SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS tags (
    tag_id       TEXT PRIMARY KEY,
    taxonomy     TEXT NOT NULL,   -- 'recipient' | 'donor' | 'category' | 'year'
    slug         TEXT NOT NULL,
    display_name TEXT NOT NULL,
    parent_id    TEXT REFERENCES tags(tag_id),   -- donor hierarchy only
    UNIQUE (taxonomy, slug)
);

-- Records are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS records (
    record_id    TEXT PRIMARY KEY,
    recipient_id TEXT NOT NULL REFERENCES tags(tag_id),
    donor_id     TEXT NOT NULL REFERENCES tags(tag_id),   -- leaf donor
    year_id      TEXT NOT NULL REFERENCES tags(tag_id),
    amount       TEXT NOT NULL DEFAULT '',   -- raw source text; parsed on read
    disclosed    INTEGER NOT NULL DEFAULT 1,
    source       TEXT,
    recorded_at  TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

CREATE TABLE IF NOT EXISTS record_categories (
    record_id TEXT NOT NULL REFERENCES records(record_id),
    tag_id    TEXT NOT NULL REFERENCES tags(tag_id),
    UNIQUE (record_id, tag_id)
);

CREATE TABLE IF NOT EXISTS profiles (
    recipient_id       TEXT PRIMARY KEY REFERENCES tags(tag_id),
    transparency_score INTEGER NOT NULL DEFAULT 0,
    declines           TEXT NOT NULL DEFAULT '[]'   -- JSON array of category slugs
);

CREATE INDEX IF NOT EXISTS tags_taxonomy_idx       ON tags(taxonomy);
CREATE INDEX IF NOT EXISTS tags_parent_idx         ON tags(parent_id);
CREATE INDEX IF NOT EXISTS records_recipient_idx   ON records(recipient_id);
CREATE INDEX IF NOT EXISTS records_donor_idx       ON records(donor_id);
CREATE INDEX IF NOT EXISTS records_year_idx        ON records(year_id);
CREATE INDEX IF NOT EXISTS record_categories_r_idx ON record_categories(record_id);

PRAGMA user_version = 1;
";
