//! Report memoisation.
//!
//! The cache is an explicit injected port so the engine stays pure and
//! independently testable. Keys are derived from the full normalised filter
//! tuple; a legitimately empty report is cached like any other. Stale
//! entries are recomputed synchronously on next access — there is no
//! background refresh.

use std::{
  collections::HashMap,
  sync::{Arc, RwLock},
  time::{Duration, Instant},
};

use fundlens_core::report::ReportTable;

/// Default time-to-live for cached reports.
pub const DEFAULT_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// A key/value store for assembled reports.
///
/// Implementations must support concurrent reads and per-key atomic writes.
/// A duplicate concurrent recompute on a miss is acceptable; a partially
/// written entry is not.
pub trait ReportCache: Send + Sync {
  fn get(&self, key: &str) -> Option<Arc<ReportTable>>;
  fn put(&self, key: &str, table: Arc<ReportTable>, ttl: Duration);
}

// ─── In-memory implementation ────────────────────────────────────────────────

struct Entry {
  table:      Arc<ReportTable>,
  expires_at: Instant,
}

/// Process-local cache guarded by an `RwLock`. Entries are replaced
/// wholesale under the write lock, so readers never observe partial data.
#[derive(Default)]
pub struct MemoryCache {
  entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
  pub fn new() -> Self { Self::default() }
}

impl ReportCache for MemoryCache {
  fn get(&self, key: &str) -> Option<Arc<ReportTable>> {
    let entries = self.entries.read().expect("cache lock poisoned");
    let entry = entries.get(key)?;
    if entry.expires_at <= Instant::now() {
      // Expired: report a miss and let the subsequent put overwrite it.
      return None;
    }
    Some(entry.table.clone())
  }

  fn put(&self, key: &str, table: Arc<ReportTable>, ttl: Duration) {
    let mut entries = self.entries.write().expect("cache lock poisoned");
    // Opportunistically drop whatever else has expired.
    let now = Instant::now();
    entries.retain(|_, e| e.expires_at > now);
    entries.insert(key.to_owned(), Entry { table, expires_at: now + ttl });
  }
}

/// A cache that never hits — used to disable memoisation entirely.
pub struct NoCache;

impl ReportCache for NoCache {
  fn get(&self, _key: &str) -> Option<Arc<ReportTable>> { None }
  fn put(&self, _key: &str, _table: Arc<ReportTable>, _ttl: Duration) {}
}

#[cfg(test)]
mod tests {
  use fundlens_core::report::ReportTable;

  use super::*;

  fn table() -> Arc<ReportTable> {
    Arc::new(ReportTable::empty(Vec::new()))
  }

  #[test]
  fn hit_within_ttl() {
    let cache = MemoryCache::new();
    cache.put("k", table(), Duration::from_secs(60));
    assert!(cache.get("k").is_some());
    assert!(cache.get("other").is_none());
  }

  #[test]
  fn expired_entry_misses() {
    let cache = MemoryCache::new();
    cache.put("k", table(), Duration::ZERO);
    assert!(cache.get("k").is_none());
  }

  #[test]
  fn put_replaces_existing_entry() {
    let cache = MemoryCache::new();
    cache.put("k", table(), Duration::ZERO);
    cache.put("k", table(), Duration::from_secs(60));
    assert!(cache.get("k").is_some());
  }

  #[test]
  fn no_cache_never_hits() {
    let cache = NoCache;
    cache.put("k", table(), Duration::from_secs(60));
    assert!(cache.get("k").is_none());
  }
}
