//! Time dimension store with O(1) key and id lookups
//!
//! The store indexes every time dimension row by its natural key
//! (year, month, day, hour, minute) and by its surrogate id. It is loaded
//! once from a warehouse snapshot and then only grows: rows are appended
//! by [`DimensionResolver`] and never mutated or removed.

use crate::config::SnapshotConflictPolicy;
use crate::error::{EtlError, Result};
use crate::models::{TimeDimensionRow, TimeId, TimeKey};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, info, warn};

pub mod resolver;
pub mod snapshot;

pub use resolver::{DimensionResolver, ResolveStats};
pub use snapshot::load_snapshot;

/// Position in the store's allocation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Checkpoint(usize);

/// Statistics about loading the initial snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Rows offered to the store
    pub rows_read: usize,

    /// Rows kept after deduplication
    pub rows_loaded: usize,

    /// Rows dropped because their key was already present
    pub duplicates_dropped: usize,

    /// Dropped duplicates whose id differed from the kept row
    pub conflicting_duplicates: usize,
}

/// Time dimension providing O(1) key → id and id → row lookups
#[derive(Debug, Clone)]
pub struct TimeDimensionStore {
    /// Surrogate id indexed by natural key
    index: HashMap<TimeKey, TimeId>,

    /// Position in `rows` indexed by surrogate id
    positions: HashMap<TimeId, usize>,

    /// Rows in load order followed by allocation order
    rows: Vec<TimeDimensionRow>,

    /// Next id handed out by `allocate`
    next_id: TimeId,

    /// Number of rows that came from the snapshot
    snapshot_len: usize,
}

impl TimeDimensionStore {
    /// Create an empty store; the first allocated id is 1
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            positions: HashMap::new(),
            rows: Vec::new(),
            next_id: 1,
            snapshot_len: 0,
        }
    }

    /// Build a store from snapshot rows, deduplicating by key.
    ///
    /// The first row for a key wins. A later row with the same key and a
    /// different id is dropped with a warning, or rejected under
    /// [`SnapshotConflictPolicy::Reject`]. Two kept rows sharing an id is
    /// always an integrity error.
    pub fn load(
        rows: impl IntoIterator<Item = TimeDimensionRow>,
        policy: SnapshotConflictPolicy,
    ) -> Result<(Self, LoadStats)> {
        let mut store = Self::new();
        let mut stats = LoadStats::default();

        for row in rows {
            stats.rows_read += 1;

            if let Some(&existing_id) = store.index.get(&row.key) {
                stats.duplicates_dropped += 1;

                if existing_id != row.id {
                    stats.conflicting_duplicates += 1;
                    if policy == SnapshotConflictPolicy::Reject {
                        return Err(EtlError::data_integrity(format!(
                            "snapshot key {} has conflicting ids {} and {}",
                            row.key, existing_id, row.id
                        )));
                    }
                    warn!(
                        "Duplicate time key {} with id {} (keeping id {})",
                        row.key, row.id, existing_id
                    );
                } else {
                    debug!("Duplicate snapshot row for {} dropped", row.key);
                }
                // The dropped id may still exist in the warehouse
                store.reserve_through(row.id)?;
                continue;
            }

            store.insert(row)?;
        }

        store.snapshot_len = store.rows.len();
        stats.rows_loaded = store.rows.len();

        info!(
            "Loaded time dimension: {} rows ({} duplicates dropped), next id {}",
            stats.rows_loaded, stats.duplicates_dropped, store.next_id
        );

        Ok((store, stats))
    }

    /// Look up the id of a key (O(1))
    pub fn lookup(&self, key: &TimeKey) -> Option<TimeId> {
        self.index.get(key).copied()
    }

    /// Look up a row by id (O(1))
    pub fn get(&self, id: TimeId) -> Option<&TimeDimensionRow> {
        self.positions.get(&id).map(|&position| &self.rows[position])
    }

    /// Check if a key is present
    pub fn contains_key(&self, key: &TimeKey) -> bool {
        self.index.contains_key(key)
    }

    /// Allocate a new row for an absent key and return its id
    pub fn allocate(&mut self, key: TimeKey) -> Result<TimeId> {
        if let Some(existing) = self.lookup(&key) {
            return Err(EtlError::data_integrity(format!(
                "cannot allocate {}: already present with id {}",
                key, existing
            )));
        }

        let id = self.next_id;
        self.insert(TimeDimensionRow { id, key })?;
        Ok(id)
    }

    /// Current position in allocation order
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.rows.len())
    }

    /// Position right after the snapshot rows
    pub fn snapshot_checkpoint(&self) -> Checkpoint {
        Checkpoint(self.snapshot_len)
    }

    /// Rows added after the checkpoint, in allocation order
    pub fn new_rows_since(&self, checkpoint: Checkpoint) -> &[TimeDimensionRow] {
        self.rows.get(checkpoint.0..).unwrap_or(&[])
    }

    /// All rows, snapshot first
    pub fn rows(&self) -> &[TimeDimensionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows that came from the snapshot
    pub fn snapshot_len(&self) -> usize {
        self.snapshot_len
    }

    /// Number of rows allocated since the snapshot
    pub fn allocated_len(&self) -> usize {
        self.rows.len() - self.snapshot_len
    }

    /// Largest id seen, including ids of dropped snapshot duplicates
    pub fn max_id(&self) -> Option<TimeId> {
        self.next_id.checked_sub(1).filter(|_| !self.rows.is_empty())
    }

    fn insert(&mut self, row: TimeDimensionRow) -> Result<()> {
        match self.positions.entry(row.id) {
            Entry::Occupied(occupied) => {
                let other = self.rows[*occupied.get()];
                return Err(EtlError::data_integrity(format!(
                    "id {} used for both {} and {}",
                    row.id, other.key, row.key
                )));
            }
            Entry::Vacant(vacant) => {
                vacant.insert(self.rows.len());
            }
        }

        self.index.insert(row.key, row.id);
        self.rows.push(row);
        self.reserve_through(row.id)
    }

    /// Never hand out `id` or anything below it
    fn reserve_through(&mut self, id: TimeId) -> Result<()> {
        let after = id.checked_add(1).ok_or_else(|| {
            EtlError::data_integrity(format!("id {} leaves no room for new time rows", id))
        })?;
        self.next_id = self.next_id.max(after);
        Ok(())
    }
}

impl Default for TimeDimensionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(y: i32, mo: u8, d: u8, h: u8, mi: u8) -> TimeKey {
        TimeKey::new(y, mo, d, h, mi).unwrap()
    }

    fn row(id: TimeId, key: TimeKey) -> TimeDimensionRow {
        TimeDimensionRow { id, key }
    }

    #[test]
    fn test_empty_store_allocates_from_one() {
        let mut store = TimeDimensionStore::new();
        assert!(store.is_empty());
        assert_eq!(store.max_id(), None);

        let id = store.allocate(key(2006, 3, 15, 10, 30)).unwrap();
        assert_eq!(id, 1);
        assert_eq!(store.max_id(), Some(1));
    }

    #[test]
    fn test_allocation_continues_after_max_snapshot_id() {
        let (mut store, stats) = TimeDimensionStore::load(
            vec![row(7, key(2005, 9, 1, 0, 0)), row(3, key(2005, 9, 1, 0, 1))],
            SnapshotConflictPolicy::KeepFirst,
        )
        .unwrap();

        assert_eq!(stats.rows_loaded, 2);
        assert_eq!(store.allocate(key(2005, 9, 1, 0, 2)).unwrap(), 8);
        assert_eq!(store.allocate(key(2005, 9, 1, 0, 3)).unwrap(), 9);
    }

    #[test]
    fn test_load_keeps_first_duplicate() {
        let (store, stats) = TimeDimensionStore::load(
            vec![
                row(1, key(2005, 9, 1, 0, 0)),
                row(2, key(2005, 9, 1, 0, 0)),
                row(1, key(2005, 9, 1, 0, 0)),
            ],
            SnapshotConflictPolicy::KeepFirst,
        )
        .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup(&key(2005, 9, 1, 0, 0)), Some(1));
        assert_eq!(stats.duplicates_dropped, 2);
        assert_eq!(stats.conflicting_duplicates, 1);
        assert_eq!(store.max_id(), Some(2));
    }

    #[test]
    fn test_dropped_duplicate_id_is_never_allocated() {
        let (mut store, _) = TimeDimensionStore::load(
            vec![row(1, key(2005, 9, 1, 0, 0)), row(2, key(2005, 9, 1, 0, 0))],
            SnapshotConflictPolicy::KeepFirst,
        )
        .unwrap();

        let id = store.allocate(key(2005, 9, 1, 0, 1)).unwrap();
        assert_eq!(id, 3);
        assert!(store.get(2).is_none());
    }

    #[test]
    fn test_max_snapshot_id_leaves_no_room() {
        let result = TimeDimensionStore::load(
            vec![row(u64::MAX, key(2005, 9, 1, 0, 0))],
            SnapshotConflictPolicy::KeepFirst,
        );
        assert!(matches!(result, Err(EtlError::DataIntegrity { .. })));

        let result = TimeDimensionStore::load(
            vec![row(1, key(2005, 9, 1, 0, 0)), row(u64::MAX, key(2005, 9, 1, 0, 0))],
            SnapshotConflictPolicy::KeepFirst,
        );
        assert!(matches!(result, Err(EtlError::DataIntegrity { .. })));
    }

    #[test]
    fn test_load_rejects_conflicts_when_configured() {
        let result = TimeDimensionStore::load(
            vec![row(1, key(2005, 9, 1, 0, 0)), row(2, key(2005, 9, 1, 0, 0))],
            SnapshotConflictPolicy::Reject,
        );
        assert!(matches!(result, Err(EtlError::DataIntegrity { .. })));
    }

    #[test]
    fn test_load_rejects_shared_id() {
        let result = TimeDimensionStore::load(
            vec![row(1, key(2005, 9, 1, 0, 0)), row(1, key(2005, 9, 1, 0, 1))],
            SnapshotConflictPolicy::KeepFirst,
        );
        assert!(matches!(result, Err(EtlError::DataIntegrity { .. })));
    }

    #[test]
    fn test_allocate_existing_key_is_an_error() {
        let mut store = TimeDimensionStore::new();
        store.allocate(key(2006, 1, 1, 0, 0)).unwrap();
        assert!(matches!(
            store.allocate(key(2006, 1, 1, 0, 0)),
            Err(EtlError::DataIntegrity { .. })
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_reverse_lookup() {
        let mut store = TimeDimensionStore::new();
        let k = key(2006, 2, 28, 23, 59);
        let id = store.allocate(k).unwrap();

        assert_eq!(store.get(id).map(|r| r.key), Some(k));
        assert!(store.get(id + 1).is_none());
        assert!(store.contains_key(&k));
    }

    #[test]
    fn test_new_rows_since_checkpoint() {
        let (mut store, _) = TimeDimensionStore::load(
            vec![row(10, key(2005, 9, 1, 0, 0))],
            SnapshotConflictPolicy::KeepFirst,
        )
        .unwrap();

        let baseline = store.snapshot_checkpoint();
        assert!(store.new_rows_since(baseline).is_empty());

        store.allocate(key(2005, 9, 2, 0, 0)).unwrap();
        let middle = store.checkpoint();
        store.allocate(key(2005, 9, 3, 0, 0)).unwrap();

        let all_new: Vec<TimeId> = store.new_rows_since(baseline).iter().map(|r| r.id).collect();
        assert_eq!(all_new, vec![11, 12]);

        let later: Vec<TimeId> = store.new_rows_since(middle).iter().map(|r| r.id).collect();
        assert_eq!(later, vec![12]);

        assert_eq!(store.snapshot_len(), 1);
        assert_eq!(store.allocated_len(), 2);
    }
}
