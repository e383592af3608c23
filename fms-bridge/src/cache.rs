//! Change-detection cache
//!
//! Remembers, per Source id, the last status that was successfully delivered to
//! the Target. The cache lives as long as the engine that owns it; nothing is
//! persisted. Entries are created once (seeding) and then only replaced through
//! a compare-and-swap, so overlapping writers cannot silently lose an update.

use crate::types::{Position, Result, SourceStatus, SyncError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// The part of a Source status that change detection looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub status: i32,
    pub position: Position,
}

impl From<&SourceStatus> for StatusSnapshot {
    fn from(source: &SourceStatus) -> Self {
        Self {
            status: source.status,
            position: source.position(),
        }
    }
}

/// What counts as a change worth pushing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangePolicy {
    /// Push only when the status code differs
    #[default]
    StatusOnly,
    /// Push when the status code or the position differs
    StatusAndPosition,
}

impl ChangePolicy {
    /// Decide whether `current` differs from `cached` under this policy
    pub fn has_changed(&self, cached: &StatusSnapshot, current: &StatusSnapshot) -> bool {
        match self {
            ChangePolicy::StatusOnly => cached.status != current.status,
            ChangePolicy::StatusAndPosition => cached != current,
        }
    }
}

/// Concurrent map of Source id to last delivered snapshot
#[derive(Debug, Default)]
pub struct StatusCache {
    entries: DashMap<String, StatusSnapshot>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached snapshot for a vehicle, if it was ever seeded
    pub fn get(&self, source_id: &str) -> Option<StatusSnapshot> {
        self.entries.get(source_id).map(|entry| *entry.value())
    }

    /// Cached status code for a vehicle
    pub fn status(&self, source_id: &str) -> Option<i32> {
        self.get(source_id).map(|snapshot| snapshot.status)
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.entries.contains_key(source_id)
    }

    /// Insert the first snapshot for a vehicle
    ///
    /// Fails with `AlreadySeeded` instead of overwriting an existing entry.
    pub fn seed(&self, source_id: &str, snapshot: StatusSnapshot) -> Result<()> {
        match self.entries.entry(source_id.to_string()) {
            Entry::Occupied(_) => Err(SyncError::AlreadySeeded(source_id.to_string())),
            Entry::Vacant(vacant) => {
                vacant.insert(snapshot);
                Ok(())
            }
        }
    }

    /// Replace a snapshot, but only if it still equals `expected`
    ///
    /// Fails with `CacheConflict` if the entry is missing or was changed by
    /// someone else since `expected` was read.
    pub fn compare_and_swap(
        &self,
        source_id: &str,
        expected: &StatusSnapshot,
        updated: StatusSnapshot,
    ) -> Result<()> {
        let mut entry = self
            .entries
            .get_mut(source_id)
            .ok_or_else(|| SyncError::CacheConflict(source_id.to_string()))?;

        if *entry != *expected {
            return Err(SyncError::CacheConflict(source_id.to_string()));
        }

        *entry = updated;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
