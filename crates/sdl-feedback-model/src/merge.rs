// SPDX-License-Identifier: Apache-2.0

use crate::entry::{Entry, EntryId};
use std::collections::HashSet;

/// Union keyed by id: every local entry is kept in place, remote entries with
/// unseen ids are appended in remote order.
#[must_use]
pub fn merge(local: Vec<Entry>, remote: Vec<Entry>) -> Vec<Entry> {
    let mut seen: HashSet<EntryId> = HashSet::with_capacity(local.len() + remote.len());
    let mut merged = Vec::with_capacity(local.len() + remote.len());
    for entry in local.into_iter().chain(remote) {
        if seen.insert(entry.id.clone()) {
            merged.push(entry);
        }
    }
    merged
}

/// First occurrence of each id wins.
#[must_use]
pub fn dedupe_by_id(entries: Vec<Entry>) -> Vec<Entry> {
    merge(entries, Vec::new())
}
