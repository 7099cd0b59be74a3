// SPDX-License-Identifier: Apache-2.0

use crate::backend::{SlotStorage, StoreError, StoreErrorCode};
use crate::paths::ENTRIES_SLOT;
use sdl_feedback_model::{dedupe_by_id, display_order, merge, Entry, PageKey};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Inserted,
    AlreadyPresent,
}

/// Append-only, page-partitioned entry collection backed by one slot.
///
/// Every mutation rewrites the whole slot. When a write fails the new entries
/// are kept in memory for the lifetime of the store and folded into every
/// later read and write, so the collection never shrinks from the caller's
/// point of view.
pub struct EntryStore {
    slots: Arc<dyn SlotStorage>,
    unpersisted: Vec<Entry>,
}

impl EntryStore {
    #[must_use]
    pub fn new(slots: Arc<dyn SlotStorage>) -> Self {
        Self {
            slots,
            unpersisted: Vec::new(),
        }
    }

    /// Inserts `entry` unless its id is already known.
    ///
    /// A `Persistence` error means the entry is visible in memory but did not
    /// reach storage; callers treat it as a warning.
    pub fn append(&mut self, entry: Entry) -> Result<AppendOutcome, StoreError> {
        let mut all = self.load_all();
        if all.iter().any(|existing| existing.id == entry.id) {
            debug!(id = %entry.id, "append skipped: id already present");
            return Ok(AppendOutcome::AlreadyPresent);
        }
        all.push(entry.clone());
        self.persist(all, vec![entry])?;
        Ok(AppendOutcome::Inserted)
    }

    #[must_use]
    pub fn query(&self, page: &PageKey) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self
            .load_all()
            .into_iter()
            .filter(|entry| &entry.page == page)
            .collect();
        display_order(&mut entries);
        entries
    }

    #[must_use]
    pub fn count(&self, page: &PageKey) -> usize {
        self.load_all()
            .iter()
            .filter(|entry| &entry.page == page)
            .count()
    }

    /// Whole collection in storage order, including entries held only in memory.
    #[must_use]
    pub fn load_all(&self) -> Vec<Entry> {
        let stored = self.read_stored();
        if self.unpersisted.is_empty() {
            stored
        } else {
            merge(stored, self.unpersisted.clone())
        }
    }

    /// Rewrites the whole collection in one write. Duplicate ids collapse to
    /// their first occurrence.
    pub fn replace_all(&mut self, entries: Vec<Entry>) -> Result<(), StoreError> {
        let entries = dedupe_by_id(entries);
        let fresh = entries.clone();
        self.persist(entries, fresh)
    }

    /// Entries visible only because their write failed.
    #[must_use]
    pub fn unpersisted_count(&self) -> usize {
        self.unpersisted.len()
    }

    fn persist(&mut self, all: Vec<Entry>, fresh: Vec<Entry>) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(&all)
            .map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))?;
        match self.slots.write(ENTRIES_SLOT, &encoded) {
            Ok(()) => {
                self.unpersisted.clear();
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "entry collection not persisted; keeping entries in memory");
                let pending = std::mem::take(&mut self.unpersisted);
                self.unpersisted = merge(pending, fresh);
                Err(err)
            }
        }
    }

    fn read_stored(&self) -> Vec<Entry> {
        match self.slots.read(ENTRIES_SLOT) {
            Ok(Some(raw)) => decode_entries(&raw),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "entry collection unreadable; treating as empty");
                Vec::new()
            }
        }
    }
}

/// Permissive decode of the entries slot: a value that is not a JSON array
/// reads as empty, and records that fail to decode are skipped.
#[must_use]
pub fn decode_entries(raw: &str) -> Vec<Entry> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    let rows = match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "entry collection is malformed; treating as empty");
            return Vec::new();
        }
    };
    let mut entries = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<Entry>(row) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(index, error = %e, "skipping malformed stored entry"),
        }
    }
    dedupe_by_id(entries)
}
