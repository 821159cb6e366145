//! Batch resolution of time keys to surrogate ids
//!
//! Resolution is a hash join of a batch against the store followed by
//! allocation of the keys the join could not match. Each distinct
//! unmatched key is allocated exactly once per batch, in order of first
//! occurrence, so duplicates inside a batch never consume extra ids and
//! a rerun over the same input produces the same ids.

use super::TimeDimensionStore;
use crate::error::{EtlError, Result};
use crate::models::{TimeId, TimeKey};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Cumulative resolution statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// Positions matched to a row that existed before the batch
    pub matched: usize,

    /// Positions filled from a row allocated by the batch
    pub filled_from_new: usize,

    /// Rows allocated
    pub allocated: usize,

    /// Positions without a key (no event)
    pub absent: usize,
}

/// Resolves batches of time keys against a [`TimeDimensionStore`]
#[derive(Debug, Clone, Default)]
pub struct DimensionResolver {
    stats: ResolveStats,
}

impl DimensionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics accumulated over every batch resolved so far
    pub fn stats(&self) -> ResolveStats {
        self.stats
    }

    /// Resolve every key of the batch, allocating rows for unknown keys.
    ///
    /// Returns one id per input key in input order.
    pub fn resolve(
        &mut self,
        keys: &[TimeKey],
        store: &mut TimeDimensionStore,
    ) -> Result<Vec<TimeId>> {
        let optional: Vec<Option<TimeKey>> = keys.iter().copied().map(Some).collect();

        self.resolve_optional(&optional, store)?
            .into_iter()
            .zip(keys)
            .map(|(id, key)| {
                id.ok_or_else(|| {
                    EtlError::data_integrity(format!("key {} left unresolved", key))
                })
            })
            .collect()
    }

    /// Resolve a batch with gaps.
    ///
    /// Absent positions stay `None` in the output and never allocate;
    /// every present position receives an id.
    pub fn resolve_optional(
        &mut self,
        keys: &[Option<TimeKey>],
        store: &mut TimeDimensionStore,
    ) -> Result<Vec<Option<TimeId>>> {
        let mut resolved: Vec<Option<TimeId>> = Vec::with_capacity(keys.len());
        let mut unresolved_positions = Vec::new();
        let mut pending: Vec<TimeKey> = Vec::new();
        let mut seen: HashSet<TimeKey> = HashSet::new();
        let mut batch = ResolveStats::default();

        // Join against the store
        for (position, key) in keys.iter().enumerate() {
            match key {
                None => {
                    batch.absent += 1;
                    resolved.push(None);
                }
                Some(key) => match store.lookup(key) {
                    Some(id) => {
                        batch.matched += 1;
                        resolved.push(Some(id));
                    }
                    None => {
                        if seen.insert(*key) {
                            pending.push(*key);
                        }
                        unresolved_positions.push(position);
                        resolved.push(None);
                    }
                },
            }
        }

        // One allocation per distinct unmatched key, first occurrence first
        let mut allocated: HashMap<TimeKey, TimeId> = HashMap::with_capacity(pending.len());
        for key in &pending {
            let id = store.allocate(*key)?;
            allocated.insert(*key, id);
            batch.allocated += 1;
        }

        for position in unresolved_positions {
            let key = keys[position].ok_or_else(|| {
                EtlError::data_integrity(format!("position {} lost its key", position))
            })?;
            let id = allocated.get(&key).copied().ok_or_else(|| {
                EtlError::data_integrity(format!("no id allocated for {}", key))
            })?;
            resolved[position] = Some(id);
            batch.filled_from_new += 1;
        }

        verify_resolution(keys, &resolved, store)?;

        debug!(
            "Resolved batch of {}: {} matched, {} allocated, {} absent",
            keys.len(),
            batch.matched,
            batch.allocated,
            batch.absent
        );

        self.stats.matched += batch.matched;
        self.stats.filled_from_new += batch.filled_from_new;
        self.stats.allocated += batch.allocated;
        self.stats.absent += batch.absent;

        Ok(resolved)
    }
}

/// Every present key must map to a stored row with that key
fn verify_resolution(
    keys: &[Option<TimeKey>],
    resolved: &[Option<TimeId>],
    store: &TimeDimensionStore,
) -> Result<()> {
    for (key, id) in keys.iter().zip(resolved) {
        match (key, id) {
            (None, None) => {}
            (Some(key), Some(id)) => {
                let stored = store.get(*id).map(|row| row.key);
                if stored != Some(*key) {
                    return Err(EtlError::data_integrity(format!(
                        "id {} resolved for {} but store holds {:?}",
                        id, key, stored
                    )));
                }
            }
            (key, id) => {
                return Err(EtlError::data_integrity(format!(
                    "resolution presence mismatch: key {:?}, id {:?}",
                    key, id
                )));
            }
        }
    }
    Ok(())
}
